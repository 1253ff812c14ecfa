// src/projector.rs
//
// Pure mappings between logical time, track pixels and (clip index, media
// offset). Nothing here is stored; callers re-derive after every mutation.

use crate::timeline::{PlacedClip, Timeline};
use serde::Serialize;

/// Where a logical instant lands on the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection<'a> {
    pub active_index: usize,
    /// Position inside the active clip's untrimmed media (seconds).
    pub media_offset: f64,
    /// Logical time at which the active clip starts.
    pub clip_start: f64,
    pub active_clip: &'a PlacedClip,
}

/// Maps `logical_time` onto the timeline. A boundary instant belongs to the
/// clip that starts there; only the final instant stays with the last clip.
/// Returns `None` for an empty timeline.
pub fn project(timeline: &Timeline, logical_time: f64) -> Option<Projection<'_>> {
    let last_index = timeline.len().checked_sub(1)?;
    let total = timeline.total_duration();
    let t = clamp_time(logical_time, total);

    let mut start = 0.0;
    for (i, placed) in timeline.iter().enumerate() {
        let end = start + placed.effective_duration();
        if t < end {
            return Some(Projection {
                active_index: i,
                media_offset: placed.left_trim() + (t - start),
                clip_start: start,
                active_clip: placed,
            });
        }
        start = end;
    }

    // t == total
    let last = timeline.get(last_index)?;
    Some(Projection {
        active_index: last_index,
        media_offset: last.right_trim(),
        clip_start: total - last.effective_duration(),
        active_clip: last,
    })
}

/// Offset of `logical_time` across a track `track_width` pixels wide.
pub fn pixel_position(timeline: &Timeline, logical_time: f64, track_width: f64) -> f64 {
    let total = timeline.total_duration();
    if total <= 0.0 || track_width <= 0.0 {
        return 0.0;
    }
    clamp_time(logical_time, total) / total * track_width
}

/// Inverse of [`pixel_position`]: logical time under a click at `px`.
pub fn time_at_pixel(timeline: &Timeline, px: f64, track_width: f64) -> f64 {
    let total = timeline.total_duration();
    if total <= 0.0 || track_width <= 0.0 || !px.is_finite() {
        return 0.0;
    }
    clamp_time(px / track_width * total, total)
}

fn clamp_time(t: f64, total: f64) -> f64 {
    if t.is_nan() {
        return 0.0;
    }
    t.clamp(0.0, total.max(0.0))
}

/// How one clip box is drawn, relative to the clip's own untrimmed length.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ClipLayout {
    pub width_percent: f64,
    pub margin_percent: f64,
    pub scale_x: f64,
}

/// Layout of a single clip box, using the live trim while a handle is held.
pub fn clip_layout(placed: &PlacedClip, zoom: f64) -> ClipLayout {
    let duration = placed.clip.duration;
    let bounds = placed.display_trim();
    if duration <= 0.0 {
        return ClipLayout {
            width_percent: 0.0,
            margin_percent: 0.0,
            scale_x: zoom,
        };
    }

    ClipLayout {
        width_percent: bounds.effective_duration() / duration * 100.0,
        margin_percent: bounds.left / duration * 100.0,
        scale_x: zoom,
    }
}

/// Horizontal extent of one clip on the shared time axis.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SegmentExtent {
    pub x: f64,
    pub width: f64,
}

pub fn segment_extents(timeline: &Timeline, track_width: f64) -> Vec<SegmentExtent> {
    let total = timeline.total_duration();
    let scale = if total > 0.0 && track_width > 0.0 {
        track_width / total
    } else {
        0.0
    };

    let mut start = 0.0;
    timeline
        .iter()
        .map(|placed| {
            let duration = placed.effective_duration();
            let extent = SegmentExtent {
                x: start * scale,
                width: duration * scale,
            };
            start += duration;
            extent
        })
        .collect()
}

/// Upper bound on the markers a single ruler carries.
pub const MAX_RULER_MARKERS: u64 = 10_000;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RulerMarker {
    pub second: u64,
    pub label: String,
    pub width_px: f64,
}

/// One marker per whole second from 0 through `floor(total_duration)`. Past
/// [`MAX_RULER_MARKERS`] seconds the markers are spaced `stride` seconds apart
/// and widened to match.
pub fn ruler_markers(total_duration: f64, zoom: f64, marker_px: f64) -> Vec<RulerMarker> {
    if !total_duration.is_finite() || total_duration < 0.0 {
        return Vec::new();
    }
    let last = total_duration.floor() as u64;
    let stride = last / MAX_RULER_MARKERS + 1;
    let width_px = marker_px * zoom * stride as f64;

    (0..=last)
        .step_by(usize::try_from(stride).unwrap_or(usize::MAX))
        .map(|second| RulerMarker {
            second,
            label: format!("{}s", second),
            width_px,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClipCatalog;

    fn timeline_of(ids: &[u32]) -> Timeline {
        let catalog = ClipCatalog::builtin();
        let mut timeline = Timeline::new();
        for id in ids {
            timeline.place(&catalog, *id).unwrap();
        }
        timeline
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_empty_timeline_has_no_active_clip() {
        let timeline = Timeline::new();
        assert!(project(&timeline, 0.0).is_none());
        assert!(project(&timeline, 5.0).is_none());
        assert_eq!(pixel_position(&timeline, 3.0, 1000.0), 0.0);
        assert_eq!(time_at_pixel(&timeline, 300.0, 1000.0), 0.0);
        assert!(segment_extents(&timeline, 1000.0).is_empty());
    }

    #[test]
    fn test_project_start_and_end() {
        let mut timeline = timeline_of(&[1, 2, 3]);
        timeline.trim(0, 0.5, 2.5).unwrap();
        timeline.trim(2, 1.0, 4.0).unwrap();

        let first = project(&timeline, 0.0).unwrap();
        assert_eq!(first.active_index, 0);
        assert_eq!(first.media_offset, 0.5);

        let total = timeline.total_duration();
        let last = project(&timeline, total).unwrap();
        assert_eq!(last.active_index, 2);
        assert_eq!(last.media_offset, 4.0);
    }

    #[test]
    fn test_boundary_goes_to_later_clip() {
        let mut timeline = timeline_of(&[1, 2, 3]);
        timeline.trim(1, 1.0, 3.0).unwrap();

        let at_boundary = project(&timeline, 3.0).unwrap();
        assert_eq!(at_boundary.active_index, 1);
        assert_eq!(at_boundary.media_offset, 1.0);
        assert_eq!(at_boundary.clip_start, 3.0);

        let inside = project(&timeline, 4.5).unwrap();
        assert_eq!(inside.active_index, 1);
        assert_close(inside.media_offset, 2.5);

        let next = project(&timeline, 5.0).unwrap();
        assert_eq!(next.active_index, 2);
        assert_close(next.media_offset, 0.0);
    }

    #[test]
    fn test_zero_width_clip_is_skipped() {
        let mut timeline = timeline_of(&[1, 2, 3]);
        timeline.trim(1, 2.0, 2.0).unwrap();

        let p = project(&timeline, 3.0).unwrap();
        assert_eq!(p.active_index, 2);
        assert_eq!(p.media_offset, 0.0);

        let extents = segment_extents(&timeline, 850.0);
        assert_eq!(extents[1].width, 0.0);
        assert_close(extents[2].x, extents[1].x);
    }

    #[test]
    fn test_out_of_range_time_is_clamped() {
        let timeline = timeline_of(&[1, 2]);
        let before = project(&timeline, -4.0).unwrap();
        assert_eq!(before.active_index, 0);
        assert_eq!(before.media_offset, 0.0);

        let after = project(&timeline, 100.0).unwrap();
        assert_eq!(after.active_index, 1);
        assert_eq!(after.media_offset, 4.2);

        let nan = project(&timeline, f64::NAN).unwrap();
        assert_eq!(nan.active_index, 0);
    }

    #[test]
    fn test_pixel_round_trip() {
        let mut timeline = timeline_of(&[1, 2, 3]);
        timeline.trim(1, 1.0, 3.0).unwrap();
        let total = timeline.total_duration();

        for step in 0..=100 {
            let t = total * step as f64 / 100.0;
            let px = pixel_position(&timeline, t, 1000.0);
            let back = time_at_pixel(&timeline, px, 1000.0);
            assert!((back - t).abs() < 1e-9, "t={} back={}", t, back);
        }

        assert_close(pixel_position(&timeline, total / 2.0, 1000.0), 500.0);
        assert_eq!(time_at_pixel(&timeline, -20.0, 1000.0), 0.0);
        assert_eq!(time_at_pixel(&timeline, 2000.0, 1000.0), total);
    }

    #[test]
    fn test_clip_layout_is_relative_to_own_duration() {
        let mut timeline = timeline_of(&[1, 2]);
        timeline.trim(1, 1.05, 3.15).unwrap();

        let full = clip_layout(timeline.get(0).unwrap(), 1.0);
        assert_close(full.width_percent, 100.0);
        assert_eq!(full.margin_percent, 0.0);

        let trimmed = clip_layout(timeline.get(1).unwrap(), 1.5);
        assert_close(trimmed.width_percent, 50.0);
        assert_close(trimmed.margin_percent, 25.0);
        assert_eq!(trimmed.scale_x, 1.5);
    }

    #[test]
    fn test_clip_layout_follows_live_trim() {
        let mut timeline = timeline_of(&[1]);
        timeline.begin_trim(0).unwrap();
        timeline.preview_trim(0, 0.0, 1.5).unwrap();

        let layout = clip_layout(timeline.get(0).unwrap(), 1.0);
        assert_close(layout.width_percent, 50.0);
        assert_eq!(timeline.total_duration(), 3.0);
    }

    #[test]
    fn test_segment_extents_are_cumulative() {
        let timeline = timeline_of(&[1, 2, 3]);
        let extents = segment_extents(&timeline, 1270.0);
        assert_eq!(extents.len(), 3);
        assert_close(extents[0].x, 0.0);
        assert_close(extents[0].width, 300.0);
        assert_close(extents[1].x, 300.0);
        assert_close(extents[2].x, 720.0);
        assert_close(extents[2].x + extents[2].width, 1270.0);
    }

    #[test]
    fn test_ruler_markers() {
        let markers = ruler_markers(12.7, 1.5, 50.0);
        assert_eq!(markers.len(), 13);
        assert_eq!(markers[0].label, "0s");
        assert_eq!(markers[12].label, "12s");
        assert_eq!(markers[3].width_px, 75.0);

        assert_eq!(ruler_markers(0.0, 1.0, 50.0).len(), 1);
        assert!(ruler_markers(f64::NAN, 1.0, 50.0).is_empty());
    }

    #[test]
    fn test_ruler_on_very_long_track_is_thinned() {
        let markers = ruler_markers(1e10, 1.0, 50.0);
        assert_eq!(markers.len(), 10_000);
        assert_eq!(markers[0].second, 0);
        assert_eq!(markers[1].second, 1_000_001);
        assert_eq!(markers[1].label, "1000001s");
        assert_eq!(markers[0].width_px, 50.0 * 1_000_001.0);
        assert!(markers.last().unwrap().second <= 10_000_000_000);

        // Right at the limit every second still gets a marker
        let markers = ruler_markers(9_999.5, 1.0, 50.0);
        assert_eq!(markers.len(), 10_000);
        assert_eq!(markers[1].second, 1);

        assert!(ruler_markers(1e300, 1.0, 50.0).len() as u64 <= MAX_RULER_MARKERS);
    }
}
