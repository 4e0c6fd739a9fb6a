use crate::timeline::Timeline;
use crate::types::*;
use uuid::Uuid;

/// Collect snap candidates from a timeline: zero plus every clip's start and
/// end, skipping `exclude_clip_id` (the clip being dragged). Stable clip
/// order, duplicates removed.
pub fn snap_points(timeline: &Timeline, exclude_clip_id: Option<Uuid>) -> Vec<TimeUs> {
    let mut points = vec![TimeUs::ZERO];

    for clip in &timeline.clips {
        if Some(clip.id) == exclude_clip_id {
            continue;
        }
        points.push(clip.start_us);
        points.push(clip.end_us());
    }

    // Dedup without sorting so the first-candidate tie-break stays stable.
    let mut seen = std::collections::BTreeSet::new();
    points.retain(|p| seen.insert(*p));
    points
}

/// Snap to the nearest candidate strictly closer than `threshold`, otherwise
/// return `position` unchanged. The first candidate wins an exact tie.
pub fn snap_to_points(position: TimeUs, points: &[TimeUs], threshold: TimeUs) -> TimeUs {
    let mut best = position;
    let mut best_dist = threshold;

    for &point in points {
        let dist = (position - point).abs();
        if dist < best_dist {
            best = point;
            best_dist = dist;
        }
    }

    best
}

/// Pointer-move entry point: identity when snapping is disabled.
pub fn snap_time(
    timeline: &Timeline,
    position: TimeUs,
    enabled: bool,
    threshold: TimeUs,
    exclude_clip_id: Option<Uuid>,
) -> TimeUs {
    if !enabled {
        return position;
    }
    let points = snap_points(timeline, exclude_clip_id);
    snap_to_points(position, &points, threshold)
}
