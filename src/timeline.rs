// src/timeline.rs
use crate::catalog::{Clip, ClipCatalog, ClipId};
use crate::error::EditorError;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// In/out points selecting a sub-range of a clip's untrimmed media (seconds).
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct TrimBounds {
    pub left: f64,
    pub right: f64,
}

impl TrimBounds {
    pub fn full(duration: f64) -> Self {
        Self {
            left: 0.0,
            right: duration,
        }
    }

    pub fn effective_duration(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    /// Nearest bounds satisfying `0 <= left <= right <= duration`. Non-finite
    /// inputs keep the corresponding bound of `fallback`.
    fn clamped(left: f64, right: f64, duration: f64, fallback: TrimBounds) -> Self {
        let pick = |v: f64, prev: f64| if v.is_finite() { v } else { prev };
        let right = pick(right, fallback.right).clamp(0.0, duration);
        let left = pick(left, fallback.left).clamp(0.0, duration).min(right);
        Self { left, right }
    }
}

/// One instance of a catalog clip on the track.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PlacedClip {
    pub placement_id: String,
    pub clip: Arc<Clip>,
    trim: TrimBounds,
    // Live value while a trim handle is held; `trim` stays authoritative.
    pending_trim: Option<TrimBounds>,
}

impl PlacedClip {
    fn new(clip: Arc<Clip>) -> Self {
        Self {
            placement_id: format!("{}-{}", clip.id, Uuid::new_v4()),
            trim: TrimBounds::full(clip.duration),
            clip,
            pending_trim: None,
        }
    }

    pub fn left_trim(&self) -> f64 {
        self.trim.left
    }

    pub fn right_trim(&self) -> f64 {
        self.trim.right
    }

    pub fn trim(&self) -> TrimBounds {
        self.trim
    }

    pub fn pending_trim(&self) -> Option<TrimBounds> {
        self.pending_trim
    }

    /// Bounds the track should draw: the live drag value if any.
    pub fn display_trim(&self) -> TrimBounds {
        self.pending_trim.unwrap_or(self.trim)
    }

    pub fn effective_duration(&self) -> f64 {
        self.trim.effective_duration()
    }

    pub fn is_degenerate(&self) -> bool {
        self.effective_duration() <= 0.0
    }
}

/// Result of a committed trim. `violation` carries the range error when the
/// requested bounds had to be clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimApplied {
    pub index: usize,
    pub bounds: TrimBounds,
    pub violation: Option<EditorError>,
}

/// The ordered track. Order is both playback order and left-to-right order.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    clips: Vec<PlacedClip>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clips(&self) -> &[PlacedClip] {
        &self.clips
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlacedClip> {
        self.clips.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PlacedClip> {
        self.clips.get(index)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn position_of(&self, placement_id: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.placement_id == placement_id)
    }

    /// Sum of committed effective durations. Always derived, never cached.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(PlacedClip::effective_duration).sum()
    }

    /// Logical time at which the clip at `index` starts.
    pub fn start_of(&self, index: usize) -> f64 {
        self.clips
            .iter()
            .take(index)
            .map(PlacedClip::effective_duration)
            .sum()
    }

    pub fn place(&mut self, catalog: &ClipCatalog, clip_id: ClipId) -> Result<&PlacedClip, EditorError> {
        let clip = catalog.get(clip_id)?;
        let placed = PlacedClip::new(clip);

        info!(
            "➡️ Placed '{}' as {} ({:.2}s)",
            placed.clip.name,
            placed.placement_id,
            placed.clip.duration
        );

        self.clips.push(placed);
        Ok(&self.clips[self.clips.len() - 1])
    }

    /// Moves the clip at `from` so it ends up at `to`. Returns false (and
    /// changes nothing) for a same-index or out-of-range request.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.clips.len();
        if from == to || from >= len || to >= len {
            debug!("Ignoring reorder {} -> {} on {} clips", from, to, len);
            return false;
        }

        let moved = self.clips.remove(from);
        self.clips.insert(to, moved);
        info!("🔀 Reordered clip {} -> {}", from, to);
        true
    }

    /// Replaces both committed bounds of the clip at `index`, clamping into
    /// `0 <= left <= right <= duration`.
    pub fn trim(&mut self, index: usize, left: f64, right: f64) -> Result<TrimApplied, EditorError> {
        let len = self.clips.len();
        let placed = self
            .clips
            .get_mut(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })?;

        let duration = placed.clip.duration;
        let bounds = TrimBounds::clamped(left, right, duration, placed.trim);
        let violation = if bounds.left != left || bounds.right != right {
            let err = EditorError::Range {
                placement_id: placed.placement_id.clone(),
                left,
                right,
                duration,
            };
            warn!("⚠️ {}; clamped to [{:.3}, {:.3}]", err, bounds.left, bounds.right);
            Some(err)
        } else {
            None
        };

        placed.trim = bounds;
        debug!(
            "✂️ Trimmed {} to [{:.3}, {:.3}]",
            placed.placement_id, bounds.left, bounds.right
        );

        Ok(TrimApplied {
            index,
            bounds,
            violation,
        })
    }

    /// Starts a live trim on the clip at `index`, seeded with its committed bounds.
    pub fn begin_trim(&mut self, index: usize) -> Result<TrimBounds, EditorError> {
        let len = self.clips.len();
        let placed = self
            .clips
            .get_mut(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })?;
        placed.pending_trim = Some(placed.trim);
        Ok(placed.trim)
    }

    /// Updates the live trim. The committed bounds are untouched.
    pub fn preview_trim(&mut self, index: usize, left: f64, right: f64) -> Result<TrimBounds, EditorError> {
        let len = self.clips.len();
        let placed = self
            .clips
            .get_mut(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })?;
        let current = placed.display_trim();
        let bounds = TrimBounds::clamped(left, right, placed.clip.duration, current);
        placed.pending_trim = Some(bounds);
        Ok(bounds)
    }

    /// Copies the live trim into the committed bounds. `None` if no trim was live.
    pub fn commit_trim(&mut self, index: usize) -> Option<TrimApplied> {
        let pending = self.clips.get_mut(index)?.pending_trim.take()?;
        self.trim(index, pending.left, pending.right).ok()
    }

    /// Drops the live trim, leaving the committed bounds as they were.
    pub fn abandon_trim(&mut self, index: usize) -> bool {
        match self.clips.get_mut(index) {
            Some(placed) => placed.pending_trim.take().is_some(),
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<PlacedClip> {
        if index >= self.clips.len() {
            return None;
        }
        let removed = self.clips.remove(index);
        info!("🗑️ Removed {} from the track", removed.placement_id);
        Some(removed)
    }
}
