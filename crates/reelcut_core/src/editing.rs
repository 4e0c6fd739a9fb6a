use crate::error::{CoreError, Result};
use crate::placement::{find_next_available_position, has_collision};
use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// Which clip edge a trim gesture is dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    Start,
    End,
}

impl Timeline {
    /// Add a clip to a track at its stated position. Rejects overlap; the
    /// caller is responsible for matching the media kind to the track kind.
    pub fn add_clip(&mut self, track_id: Uuid, mut clip: Clip) -> Result<Uuid> {
        self.ensure_unlocked(track_id)?;
        if clip.duration_us < MIN_CLIP_DURATION {
            return Err(CoreError::InvalidOperation(format!(
                "clip duration {} is below the {} floor",
                clip.duration_us, MIN_CLIP_DURATION
            )));
        }
        if clip.start_us < TimeUs::ZERO {
            return Err(CoreError::InvalidOperation(
                "clip start must not be negative".into(),
            ));
        }
        if has_collision(self, clip.id, track_id, clip.start_us, clip.duration_us) {
            return Err(CoreError::OverlapDetected);
        }

        clip.track_id = track_id;
        let id = clip.id;
        self.clips.push(clip);
        Ok(id)
    }

    /// Add a clip, resolving any conflict to the next free position instead
    /// of rejecting. The drop-from-catalog path.
    pub fn place_clip(&mut self, track_id: Uuid, mut clip: Clip) -> Result<Uuid> {
        self.ensure_unlocked(track_id)?;
        clip.start_us = find_next_available_position(
            self,
            track_id,
            clip.start_us.max(TimeUs::ZERO),
            clip.duration_us,
        );
        self.add_clip(track_id, clip)
    }

    /// Remove a clip. Cascades: any link pair referencing it is dropped and
    /// the id leaves the selection. Returns the removed clip.
    pub fn remove_clip(&mut self, clip_id: Uuid) -> Result<Clip> {
        let clip = self.require_clip(clip_id)?;
        self.ensure_unlocked(clip.track_id)?;

        let pos = self
            .clips
            .iter()
            .position(|c| c.id == clip_id)
            .ok_or(CoreError::ClipNotFound(clip_id))?;
        let removed = self.clips.remove(pos);
        self.links.retain(|l| !l.contains(clip_id));
        self.selection.remove(&clip_id);
        tracing::debug!(clip_id = %clip_id, "clip removed");
        Ok(removed)
    }

    /// Move a clip to a new track and start time. Validated first: on a
    /// collision at the target nothing changes and `OverlapDetected` is
    /// returned. A linked partner is NOT moved; the pair offset is refreshed
    /// to record the new relation.
    pub fn move_clip(&mut self, clip_id: Uuid, new_track_id: Uuid, new_start: TimeUs) -> Result<()> {
        let clip = self.require_clip(clip_id)?;
        let (old_track, duration) = (clip.track_id, clip.duration_us);
        self.ensure_unlocked(old_track)?;
        self.ensure_unlocked(new_track_id)?;

        let old_kind = self.require_track(old_track)?.kind;
        let new_kind = self.require_track(new_track_id)?.kind;
        if old_kind != new_kind {
            return Err(CoreError::InvalidOperation(
                "clip can only move between tracks of the same kind".into(),
            ));
        }

        let new_start = new_start.max(TimeUs::ZERO);
        if has_collision(self, clip_id, new_track_id, new_start, duration) {
            return Err(CoreError::OverlapDetected);
        }

        let clip = self
            .clip_mut(clip_id)
            .ok_or(CoreError::ClipNotFound(clip_id))?;
        clip.track_id = new_track_id;
        clip.start_us = new_start;
        self.update_link_offset(clip_id);
        Ok(())
    }

    /// Trim one edge of a clip by a signed time delta.
    ///
    /// The start edge shifts `start_us` and `trim_start_us` together so the
    /// visible media in-point tracks the handle; the end edge adjusts
    /// `duration_us` and `trim_end_us`. The result clamps to the duration
    /// floor and to non-negative start/trim offsets, so handles never stick;
    /// only a lock or a resulting overlap rejects the gesture.
    pub fn trim_clip(&mut self, clip_id: Uuid, edge: TrimEdge, delta: TimeUs) -> Result<()> {
        let clip = self.require_clip(clip_id)?;
        self.ensure_unlocked(clip.track_id)?;

        let (track_id, start, duration, trim_start, trim_end) = (
            clip.track_id,
            clip.start_us,
            clip.duration_us,
            clip.trim_start_us,
            clip.trim_end_us,
        );

        let (new_start, new_duration, new_trim_start, new_trim_end) = match edge {
            TrimEdge::Start => {
                // Largest allowed shift toward the end keeps the floor; toward
                // the left it is bounded by start >= 0 and trim_start >= 0.
                let max_right = duration - MIN_CLIP_DURATION;
                let max_left = TimeUs::ZERO - start.min(trim_start);
                let delta = delta.clamp(max_left, max_right);
                (
                    start + delta,
                    duration - delta,
                    trim_start + delta,
                    trim_end,
                )
            }
            TrimEdge::End => {
                // Shrinking is bounded by the floor; growing by trim_end >= 0.
                let min_delta = MIN_CLIP_DURATION - duration;
                let max_delta = trim_end;
                let delta = delta.clamp(min_delta, max_delta);
                (start, duration + delta, trim_start, trim_end - delta)
            }
        };

        if has_collision(self, clip_id, track_id, new_start, new_duration) {
            return Err(CoreError::OverlapDetected);
        }

        let clip = self
            .clip_mut(clip_id)
            .ok_or(CoreError::ClipNotFound(clip_id))?;
        clip.start_us = new_start;
        clip.duration_us = new_duration;
        clip.trim_start_us = new_trim_start;
        clip.trim_end_us = new_trim_end;
        self.update_link_offset(clip_id);
        Ok(())
    }

    /// Split a clip at a timeline position strictly inside it. The left half
    /// keeps the original id; the right half is new, with its source in-point
    /// advanced by the left half's duration. Returns (left_id, right_id).
    pub fn split_clip(&mut self, clip_id: Uuid, at: TimeUs) -> Result<(Uuid, Uuid)> {
        self.split_clip_as(clip_id, at, Uuid::new_v4())
    }

    /// Split with a caller-chosen id for the right half, so a replayed split
    /// reproduces the same clip id.
    pub(crate) fn split_clip_as(
        &mut self,
        clip_id: Uuid,
        at: TimeUs,
        right_id: Uuid,
    ) -> Result<(Uuid, Uuid)> {
        let clip = self.require_clip(clip_id)?;
        self.ensure_unlocked(clip.track_id)?;

        let start = clip.start_us;
        let end = clip.end_us();
        if at <= start || at >= end {
            return Err(CoreError::InvalidOperation(
                "split position must be strictly between clip start and end".into(),
            ));
        }
        let left_dur = at - start;
        let right_dur = end - at;
        if left_dur < MIN_CLIP_DURATION || right_dur < MIN_CLIP_DURATION {
            return Err(CoreError::InvalidOperation(
                "split would produce a clip below the duration floor".into(),
            ));
        }

        let pos = self
            .clips
            .iter()
            .position(|c| c.id == clip_id)
            .ok_or(CoreError::ClipNotFound(clip_id))?;

        let mut right = self.clips[pos].clone();
        right.id = right_id;
        right.start_us = at;
        right.duration_us = right_dur;
        right.trim_start_us = right.trim_start_us + left_dur;
        right.transition_in = None;

        let left = &mut self.clips[pos];
        left.duration_us = left_dur;
        left.trim_end_us = left.trim_end_us + right_dur;
        left.transition_out = None;

        self.clips.insert(pos + 1, right);
        tracing::debug!(clip_id = %clip_id, at = %at, right_id = %right_id, "clip split");
        Ok((clip_id, right_id))
    }

    /// Link a video clip and an audio clip (in either argument order). The
    /// pair's offset records `audio.start - video.start`.
    pub fn link_clips(&mut self, a: Uuid, b: Uuid) -> Result<()> {
        let kind_a = self.clip_track_kind(a)?;
        let kind_b = self.clip_track_kind(b)?;

        let (video_id, audio_id) = match (kind_a, kind_b) {
            (TrackKind::Video, TrackKind::Audio) => (a, b),
            (TrackKind::Audio, TrackKind::Video) => (b, a),
            _ => {
                return Err(CoreError::InvalidLink(
                    "link requires exactly one video and one audio clip".into(),
                ))
            }
        };
        if self.link_for(a).is_some() || self.link_for(b).is_some() {
            return Err(CoreError::InvalidLink("clip is already linked".into()));
        }

        let video_start = self.require_clip(video_id)?.start_us;
        let audio_start = self.require_clip(audio_id)?.start_us;
        self.links.push(LinkPair {
            video_clip_id: video_id,
            audio_clip_id: audio_id,
            offset_us: audio_start - video_start,
        });
        Ok(())
    }

    /// Remove any link pair referencing the clip. No-op when unlinked.
    pub fn unlink_clip(&mut self, clip_id: Uuid) {
        self.links.retain(|l| !l.contains(clip_id));
    }

    /// Materialize the audio of a video clip as a new clip on an audio track,
    /// directly underneath it, and link the two. Returns the new clip's id.
    pub fn detach_audio(&mut self, video_clip_id: Uuid, target_track_id: Uuid) -> Result<Uuid> {
        self.detach_audio_as(video_clip_id, target_track_id, Uuid::new_v4())
    }

    /// Detach with a caller-chosen id for the new audio clip (replay support).
    pub(crate) fn detach_audio_as(
        &mut self,
        video_clip_id: Uuid,
        target_track_id: Uuid,
        audio_id: Uuid,
    ) -> Result<Uuid> {
        if self.clip_track_kind(video_clip_id)? != TrackKind::Video {
            return Err(CoreError::InvalidLink(
                "audio can only be detached from a video clip".into(),
            ));
        }
        if self.link_for(video_clip_id).is_some() {
            return Err(CoreError::InvalidLink("clip is already linked".into()));
        }
        if self.require_track(target_track_id)?.kind != TrackKind::Audio {
            return Err(CoreError::InvalidLink(
                "detach target must be an audio track".into(),
            ));
        }

        let source = self.require_clip(video_clip_id)?;
        let mut audio = Clip::new(
            source.media_id,
            target_track_id,
            source.start_us,
            source.duration_us,
        );
        audio.id = audio_id;
        audio.trim_start_us = source.trim_start_us;
        audio.trim_end_us = source.trim_end_us;
        audio.volume = source.volume;
        audio.speed = source.speed;

        let audio_id = self.add_clip(target_track_id, audio)?;
        self.link_clips(video_clip_id, audio_id)?;
        Ok(audio_id)
    }

    /// Refresh a pair's recorded offset from its members' current positions.
    /// Pure derived-state maintenance: nothing moves.
    pub fn update_link_offset(&mut self, clip_id: Uuid) {
        let Some(idx) = self.links.iter().position(|l| l.contains(clip_id)) else {
            return;
        };
        let (video_id, audio_id) = self.links[idx].members();
        let (Some(video), Some(audio)) = (self.clip(video_id), self.clip(audio_id)) else {
            return;
        };
        self.links[idx].offset_us = audio.start_us - video.start_us;
    }

    fn clip_track_kind(&self, clip_id: Uuid) -> Result<TrackKind> {
        let clip = self.require_clip(clip_id)?;
        Ok(self.require_track(clip.track_id)?.kind)
    }
}
