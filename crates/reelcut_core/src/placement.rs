use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// True if any clip on `track_id` other than `clip_id` overlaps the proposed
/// half-open interval `[start, start + duration)`. Self-exclusion is by id so
/// a clip can be tested against its own track before commit.
pub fn has_collision(
    timeline: &Timeline,
    clip_id: Uuid,
    track_id: Uuid,
    start_us: TimeUs,
    duration_us: TimeUs,
) -> bool {
    let end_us = start_us + duration_us;
    timeline
        .clips_on_track(track_id)
        .filter(|c| c.id != clip_id)
        .any(|c| start_us < c.end_us() && c.start_us < end_us)
}

/// Resolve a preferred drop position to a collision-free one.
///
/// Returns `preferred_start` untouched when it already fits. Otherwise sweeps
/// the track's clips left to right for the first gap wide enough, falling
/// back to the time just past the last clip. Never fails.
pub fn find_next_available_position(
    timeline: &Timeline,
    track_id: Uuid,
    preferred_start: TimeUs,
    duration_us: TimeUs,
) -> TimeUs {
    // A placeholder id that matches nothing: the candidate is a new clip.
    if !has_collision(timeline, Uuid::nil(), track_id, preferred_start, duration_us) {
        return preferred_start;
    }

    let mut occupied: Vec<(TimeUs, TimeUs)> = timeline
        .clips_on_track(track_id)
        .map(|c| (c.start_us, c.end_us()))
        .collect();
    occupied.sort_by_key(|(start, _)| *start);

    let mut cursor = TimeUs::ZERO;
    for (start, end) in occupied {
        if cursor + duration_us <= start {
            return cursor;
        }
        cursor = cursor.max(end);
    }
    cursor
}
