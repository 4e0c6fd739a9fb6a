use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// The authoritative timeline aggregate: tracks, clips (owned flat, keyed to
/// their track by `Clip::track_id`), link pairs, playhead, zoom, selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub tracks: Vec<Track>,
    pub clips: Vec<Clip>,
    pub links: Vec<LinkPair>,
    pub playhead_us: TimeUs,
    pub zoom: f64,
    pub selection: BTreeSet<Uuid>,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            tracks: vec![],
            clips: vec![],
            links: vec![],
            playhead_us: TimeUs::ZERO,
            zoom: 1.0,
            selection: BTreeSet::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    /// Total duration: the furthest clip end, or zero for an empty timeline.
    pub fn duration_us(&self) -> TimeUs {
        self.clips
            .iter()
            .map(|c| c.end_us())
            .max()
            .unwrap_or(TimeUs::ZERO)
    }

    /// Move the playhead, clamped to `[0, duration]`.
    pub fn set_playhead(&mut self, time_us: TimeUs) {
        self.playhead_us = time_us.clamp(TimeUs::ZERO, self.duration_us());
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(0.1, 10.0);
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn select(&mut self, clip_id: Uuid) {
        if self.clip(clip_id).is_some() {
            self.selection.insert(clip_id);
        }
    }

    pub fn deselect(&mut self, clip_id: Uuid) {
        self.selection.remove(&clip_id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, clip_id: Uuid) -> bool {
        self.selection.contains(&clip_id)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn track(&self, track_id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    pub fn clip(&self, clip_id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    pub fn clip_mut(&mut self, clip_id: Uuid) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == clip_id)
    }

    /// Clips on one track, in stable insertion order.
    pub fn clips_on_track(&self, track_id: Uuid) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(move |c| c.track_id == track_id)
    }

    /// The link pair a clip participates in, if any.
    pub fn link_for(&self, clip_id: Uuid) -> Option<&LinkPair> {
        self.links.iter().find(|l| l.contains(clip_id))
    }

    pub(crate) fn require_clip(&self, clip_id: Uuid) -> Result<&Clip> {
        self.clip(clip_id).ok_or(CoreError::ClipNotFound(clip_id))
    }

    pub(crate) fn require_track(&self, track_id: Uuid) -> Result<&Track> {
        self.track(track_id)
            .ok_or(CoreError::TrackNotFound(track_id))
    }

    /// Errors if the given track is locked. Lookup failure is its own error.
    pub(crate) fn ensure_unlocked(&self, track_id: Uuid) -> Result<()> {
        let track = self.require_track(track_id)?;
        if track.locked {
            return Err(CoreError::TrackLocked(track_id));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Track management
    // -----------------------------------------------------------------------

    pub fn add_track(&mut self, track: Track) -> Uuid {
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Remove a track and cascade: its clips are deleted, along with any link
    /// pairs and selection entries referencing those clips.
    pub fn remove_track(&mut self, track_id: Uuid) -> Result<Track> {
        let pos = self
            .tracks
            .iter()
            .position(|t| t.id == track_id)
            .ok_or(CoreError::TrackNotFound(track_id))?;

        let removed_ids: Vec<Uuid> = self
            .clips_on_track(track_id)
            .map(|c| c.id)
            .collect();
        self.clips.retain(|c| c.track_id != track_id);
        self.links
            .retain(|l| !removed_ids.iter().any(|id| l.contains(*id)));
        for id in &removed_ids {
            self.selection.remove(id);
        }

        tracing::debug!(track_id = %track_id, clips = removed_ids.len(), "track removed");
        Ok(self.tracks.remove(pos))
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline_with_video_track() -> (Timeline, Uuid) {
        let mut tl = Timeline::new();
        let track_id = tl.add_track(Track::new("V1", TrackKind::Video));
        (tl, track_id)
    }

    #[test]
    fn empty_timeline_duration_is_zero() {
        let tl = Timeline::new();
        assert_eq!(tl.duration_us(), TimeUs::ZERO);
    }

    #[test]
    fn duration_is_furthest_clip_end() {
        let (mut tl, track_id) = timeline_with_video_track();
        tl.clips.push(Clip::new(
            Uuid::new_v4(),
            track_id,
            TimeUs(0),
            TimeUs(5_000_000),
        ));
        tl.clips.push(Clip::new(
            Uuid::new_v4(),
            track_id,
            TimeUs(8_000_000),
            TimeUs(2_000_000),
        ));
        assert_eq!(tl.duration_us(), TimeUs(10_000_000));
    }

    #[test]
    fn playhead_clamps_to_duration() {
        let (mut tl, track_id) = timeline_with_video_track();
        tl.clips.push(Clip::new(
            Uuid::new_v4(),
            track_id,
            TimeUs(0),
            TimeUs(5_000_000),
        ));

        tl.set_playhead(TimeUs(3_000_000));
        assert_eq!(tl.playhead_us, TimeUs(3_000_000));

        tl.set_playhead(TimeUs(9_000_000));
        assert_eq!(tl.playhead_us, TimeUs(5_000_000));

        tl.set_playhead(TimeUs(-1));
        assert_eq!(tl.playhead_us, TimeUs::ZERO);
    }

    #[test]
    fn zoom_clamps() {
        let mut tl = Timeline::new();
        tl.set_zoom(50.0);
        assert_eq!(tl.zoom, 10.0);
        tl.set_zoom(0.0);
        assert_eq!(tl.zoom, 0.1);
    }

    #[test]
    fn select_only_existing_clips() {
        let (mut tl, track_id) = timeline_with_video_track();
        let clip = Clip::new(Uuid::new_v4(), track_id, TimeUs(0), TimeUs(1_000_000));
        let clip_id = clip.id;
        tl.clips.push(clip);

        tl.select(Uuid::new_v4());
        assert!(tl.selection.is_empty());

        tl.select(clip_id);
        assert!(tl.is_selected(clip_id));

        tl.deselect(clip_id);
        assert!(!tl.is_selected(clip_id));
    }

    #[test]
    fn remove_track_cascades_clips_links_selection() {
        let (mut tl, v_track) = timeline_with_video_track();
        let a_track = tl.add_track(Track::new("A1", TrackKind::Audio));

        let video = Clip::new(Uuid::new_v4(), v_track, TimeUs(0), TimeUs(5_000_000));
        let audio = Clip::new(Uuid::new_v4(), a_track, TimeUs(0), TimeUs(5_000_000));
        let (vid, aid) = (video.id, audio.id);
        tl.clips.push(video);
        tl.clips.push(audio);
        tl.links.push(LinkPair {
            video_clip_id: vid,
            audio_clip_id: aid,
            offset_us: TimeUs::ZERO,
        });
        tl.select(vid);

        tl.remove_track(v_track).unwrap();

        assert!(tl.clip(vid).is_none());
        assert!(tl.clip(aid).is_some());
        assert!(tl.links.is_empty());
        assert!(!tl.is_selected(vid));
    }

    #[test]
    fn remove_missing_track_fails() {
        let mut tl = Timeline::new();
        assert!(matches!(
            tl.remove_track(Uuid::new_v4()).unwrap_err(),
            CoreError::TrackNotFound(_)
        ));
    }

    #[test]
    fn locked_track_detected() {
        let (mut tl, track_id) = timeline_with_video_track();
        assert!(tl.ensure_unlocked(track_id).is_ok());
        tl.track_mut(track_id).unwrap().locked = true;
        assert!(matches!(
            tl.ensure_unlocked(track_id).unwrap_err(),
            CoreError::TrackLocked(_)
        ));
    }

    #[test]
    fn serde_roundtrip_timeline() {
        let (mut tl, track_id) = timeline_with_video_track();
        let clip = Clip::new(Uuid::new_v4(), track_id, TimeUs(0), TimeUs(2_000_000));
        let clip_id = clip.id;
        tl.clips.push(clip);
        tl.select(clip_id);
        tl.set_playhead(TimeUs(1_000_000));

        let json = serde_json::to_string(&tl).unwrap();
        let back: Timeline = serde_json::from_str(&json).unwrap();
        assert_eq!(tl, back);
    }
}
