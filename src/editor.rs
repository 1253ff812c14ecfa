// src/editor.rs
use crate::catalog::{Clip, ClipCatalog, ClipId};
use crate::error::EditorError;
use crate::playback::{MediaElement, PlaybackController, PlaybackCursor, PlaybackEvent};
use crate::preferences::EditorPreferences;
use crate::projector::{self, ClipLayout, RulerMarker, SegmentExtent};
use crate::timeline::{PlacedClip, Timeline, TrimApplied, TrimBounds};
use crate::view::{EditMode, ZoomState};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrimHandle {
    Left,
    Right,
}

// A held trim handle. Tracked by placement so a reorder can't retarget it.
#[derive(Debug, Clone)]
struct TrimGesture {
    placement_id: String,
    handle: TrimHandle,
    origin: TrimBounds,
}

/// Everything the editor window shows, owned in one place. Mutation methods
/// are the only write path.
#[derive(Debug)]
pub struct EditorState {
    catalog: ClipCatalog,
    timeline: Timeline,
    playback: PlaybackController,
    zoom: ZoomState,
    mode: EditMode,
    track_width_px: f64,
    ruler_marker_px: f64,
    gesture: Option<TrimGesture>,
}

impl EditorState {
    pub fn new(catalog: ClipCatalog, prefs: &EditorPreferences) -> Self {
        let defaults = EditorPreferences::default();
        Self {
            catalog,
            timeline: Timeline::new(),
            playback: PlaybackController::new(),
            zoom: ZoomState::new(&prefs.zoom),
            mode: EditMode::default(),
            track_width_px: positive_or(prefs.track_width_px, defaults.track_width_px),
            ruler_marker_px: positive_or(prefs.ruler_marker_px, defaults.ruler_marker_px),
            gesture: None,
        }
    }

    pub fn catalog(&self) -> &ClipCatalog {
        &self.catalog
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn playback(&self) -> &PlaybackCursor {
        self.playback.cursor()
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom.level()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn track_width(&self) -> f64 {
        self.track_width_px
    }

    // --- TRACK EDITS ---

    /// A catalog clip was dropped on the track. Returns the new placement id.
    pub fn drop_scene(&mut self, clip_id: ClipId, media: &mut dyn MediaElement) -> Result<String, EditorError> {
        self.require_mode(EditMode::DragAndDrop)?;

        let placement_id = match self.timeline.place(&self.catalog, clip_id) {
            Ok(placed) => placed.placement_id.clone(),
            Err(e) => {
                warn!("⚠️ Drop ignored: {}", e);
                return Err(e);
            }
        };
        self.playback.reconcile(&self.timeline, media);
        Ok(placement_id)
    }

    pub fn reorder(&mut self, from: usize, to: usize, media: &mut dyn MediaElement) -> Result<bool, EditorError> {
        self.require_mode(EditMode::DragAndDrop)?;

        let moved = self.timeline.reorder(from, to);
        if moved {
            self.playback.reconcile(&self.timeline, media);
        }
        Ok(moved)
    }

    pub fn trim(
        &mut self,
        index: usize,
        left: f64,
        right: f64,
        media: &mut dyn MediaElement,
    ) -> Result<TrimApplied, EditorError> {
        let applied = self.timeline.trim(index, left, right)?;
        self.playback.reconcile(&self.timeline, media);
        Ok(applied)
    }

    pub fn remove(&mut self, index: usize, media: &mut dyn MediaElement) -> Option<PlacedClip> {
        let removed = self.timeline.remove(index)?;
        if self
            .gesture
            .as_ref()
            .is_some_and(|g| g.placement_id == removed.placement_id)
        {
            self.gesture = None;
        }
        self.playback.reconcile(&self.timeline, media);
        Some(removed)
    }

    // --- TRIM DRAG ---

    pub fn begin_trim_drag(&mut self, index: usize, handle: TrimHandle) -> Result<TrimBounds, EditorError> {
        self.require_mode(EditMode::Trim)?;
        self.cancel_trim_drag();

        let origin = self.timeline.begin_trim(index)?;
        let placement_id = self
            .timeline
            .get(index)
            .map(|c| c.placement_id.clone())
            .unwrap_or_default();
        debug!("✋ Trim drag started on {} ({:?})", placement_id, handle);

        self.gesture = Some(TrimGesture {
            placement_id,
            handle,
            origin,
        });
        Ok(origin)
    }

    /// Pointer moved `delta_pixels` since the handle was grabbed. Only the
    /// live trim changes; the committed bounds wait for [`Self::end_trim_drag`].
    pub fn drag_trim(&mut self, index: usize, handle: TrimHandle, delta_pixels: f64) -> Result<TrimBounds, EditorError> {
        self.require_mode(EditMode::Trim)?;

        let len = self.timeline.len();
        let placed = self
            .timeline
            .get(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })?;

        let same_gesture = self
            .gesture
            .as_ref()
            .is_some_and(|g| g.placement_id == placed.placement_id && g.handle == handle);
        if !same_gesture {
            self.begin_trim_drag(index, handle)?;
        }

        let Some(gesture) = &self.gesture else {
            return Err(EditorError::IndexOutOfRange { index, len });
        };
        let Some(placed) = self.timeline.get(index) else {
            return Err(EditorError::IndexOutOfRange { index, len });
        };

        let duration = placed.clip.duration;
        let box_width = self.zoom.scale(self.track_width_px);
        let seconds_per_px = if box_width > 0.0 { duration / box_width } else { 0.0 };
        let delta = if delta_pixels.is_finite() { delta_pixels * seconds_per_px } else { 0.0 };
        let current = placed.display_trim();

        let (left, right) = match gesture.handle {
            TrimHandle::Right => {
                let right = (gesture.origin.right + delta).min(duration).max(current.left);
                (current.left, right)
            }
            TrimHandle::Left => {
                let left = (gesture.origin.left + delta).max(0.0).min(current.right);
                (left, current.right)
            }
        };

        self.timeline.preview_trim(index, left, right)
    }

    /// Pointer released: the live trim becomes the committed trim.
    pub fn end_trim_drag(&mut self, media: &mut dyn MediaElement) -> Option<TrimApplied> {
        let gesture = self.gesture.take()?;
        let index = self.timeline.position_of(&gesture.placement_id)?;
        let applied = self.timeline.commit_trim(index)?;

        info!(
            "✂️ Trim committed on {}: [{:.2}, {:.2}]",
            gesture.placement_id, applied.bounds.left, applied.bounds.right
        );
        self.playback.reconcile(&self.timeline, media);
        Some(applied)
    }

    /// Drops an in-flight trim drag, leaving the committed bounds untouched.
    pub fn cancel_trim_drag(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        match self.timeline.position_of(&gesture.placement_id) {
            Some(index) => {
                debug!("↩️ Trim drag abandoned on {}", gesture.placement_id);
                self.timeline.abandon_trim(index)
            }
            None => false,
        }
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        if mode != EditMode::Trim {
            self.cancel_trim_drag();
        }
        if mode != self.mode {
            info!("🎛️ Edit mode: {:?}", mode);
        }
        self.mode = mode;
    }

    // --- VIEW ---

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom.zoom_out()
    }

    /// The page measured its track at `px` wide.
    pub fn set_track_width(&mut self, px: f64) {
        self.track_width_px = positive_or(px, self.track_width_px);
    }

    // --- PLAYBACK ---

    pub fn play(&mut self, media: &mut dyn MediaElement) -> Result<(), EditorError> {
        self.playback.play(&self.timeline, media)
    }

    pub fn pause(&mut self, media: &mut dyn MediaElement) {
        self.playback.pause(media)
    }

    pub fn toggle_playback(&mut self, media: &mut dyn MediaElement) -> Result<(), EditorError> {
        self.playback.toggle(&self.timeline, media)
    }

    pub fn seek(&mut self, logical_time: f64, media: &mut dyn MediaElement) -> Result<(), EditorError> {
        self.playback.seek(&self.timeline, media, logical_time)
    }

    /// Track click `px` pixels from the track's left edge.
    pub fn seek_to_pixel(&mut self, px: f64, media: &mut dyn MediaElement) -> Result<(), EditorError> {
        self.playback
            .seek_to_pixel(&self.timeline, media, px, self.track_width_px)
    }

    pub fn media_time_update(&mut self, current_time: f64, media: &mut dyn MediaElement) -> PlaybackEvent {
        self.playback.on_time_update(&self.timeline, media, current_time)
    }

    pub fn media_ended(&mut self, media: &mut dyn MediaElement) -> PlaybackEvent {
        self.playback.on_ended(&self.timeline, media)
    }

    // --- RENDER MODEL ---

    pub fn snapshot(&self) -> EditorSnapshot {
        let zoom = self.zoom.level();
        let total_duration = self.timeline.total_duration();
        let trimming = self.gesture.as_ref().map(|g| g.placement_id.as_str());

        let clips = self
            .timeline
            .iter()
            .map(|placed| ClipView {
                placement_id: placed.placement_id.clone(),
                clip_id: placed.clip.id,
                name: placed.clip.name.clone(),
                url: placed.clip.url.clone(),
                duration: placed.clip.duration,
                trim: placed.trim(),
                display_trim: placed.display_trim(),
                effective_duration: placed.effective_duration(),
                layout: projector::clip_layout(placed, zoom),
                is_trimming: trimming == Some(placed.placement_id.as_str()),
            })
            .collect();

        let cursor = self.playback.cursor().clone();
        let cursor_x = projector::pixel_position(&self.timeline, cursor.logical_time, self.track_width_px);

        EditorSnapshot {
            catalog: self.catalog.iter().cloned().collect(),
            clips,
            total_duration,
            zoom_level: zoom,
            mode: self.mode,
            track_width: self.track_width_px,
            cursor,
            cursor_x,
            ruler: projector::ruler_markers(total_duration, zoom, self.ruler_marker_px),
            segments: projector::segment_extents(&self.timeline, self.track_width_px),
            placeholder: self
                .timeline
                .is_empty()
                .then(|| EditorError::EmptyTimeline.to_string()),
        }
    }

    fn require_mode(&self, mode: EditMode) -> Result<(), EditorError> {
        if self.mode == mode {
            Ok(())
        } else {
            debug!("Gesture needs {:?} mode, editor is in {:?}", mode, self.mode);
            Err(EditorError::ModeLocked(self.mode))
        }
    }
}

// Pixel sizes from the page or preferences.json: anything but a finite
// positive value keeps `fallback`.
fn positive_or(px: f64, fallback: f64) -> f64 {
    if px.is_finite() && px > 0.0 {
        px
    } else {
        fallback
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ClipView {
    pub placement_id: String,
    pub clip_id: ClipId,
    pub name: String,
    pub url: String,
    pub duration: f64,
    pub trim: TrimBounds,
    pub display_trim: TrimBounds,
    pub effective_duration: f64,
    pub layout: ClipLayout,
    pub is_trimming: bool,
}

/// What the page draws after each command.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub catalog: Vec<Clip>,
    pub clips: Vec<ClipView>,
    pub total_duration: f64,
    pub zoom_level: f64,
    pub mode: EditMode,
    pub track_width: f64,
    pub cursor: PlaybackCursor,
    pub cursor_x: f64,
    pub ruler: Vec<RulerMarker>,
    pub segments: Vec<SegmentExtent>,
    pub placeholder: Option<String>,
}

// Holds the editor safely across Tauri's command threads
pub struct EditorEngine {
    pub state: Mutex<EditorState>,
}

impl EditorEngine {
    pub fn new(state: EditorState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{MediaCommand, MediaCommandQueue, PlaybackState};

    fn editor() -> (EditorState, MediaCommandQueue) {
        let state = EditorState::new(ClipCatalog::builtin(), &EditorPreferences::default());
        (state, MediaCommandQueue::new())
    }

    fn editor_with(ids: &[u32]) -> (EditorState, MediaCommandQueue) {
        let (mut state, mut media) = editor();
        for id in ids {
            state.drop_scene(*id, &mut media).unwrap();
        }
        media.drain();
        (state, media)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_drop_unknown_scene_is_noop() {
        let (mut state, mut media) = editor_with(&[1]);
        let before = state.timeline().clone();

        let result = state.drop_scene(404, &mut media);
        assert_eq!(result, Err(EditorError::NotFound(404)));
        assert_eq!(state.timeline(), &before);
        assert!(media.is_empty());
    }

    #[test]
    fn test_first_drop_loads_preview() {
        let (mut state, mut media) = editor();
        state.drop_scene(3, &mut media).unwrap();

        assert_eq!(state.playback().active_index, Some(0));
        assert_eq!(
            media.drain(),
            vec![
                MediaCommand::Load {
                    url: "/videos/3.mp4".to_string()
                },
                MediaCommand::Seek { time: 0.0 }
            ]
        );
    }

    #[test]
    fn test_mode_gates_gestures() {
        let (mut state, mut media) = editor_with(&[1, 2]);

        assert_eq!(
            state.drag_trim(0, TrimHandle::Right, -10.0),
            Err(EditorError::ModeLocked(EditMode::DragAndDrop))
        );

        state.set_mode(EditMode::Trim);
        assert_eq!(
            state.drop_scene(1, &mut media),
            Err(EditorError::ModeLocked(EditMode::Trim))
        );
        assert_eq!(
            state.reorder(0, 1, &mut media),
            Err(EditorError::ModeLocked(EditMode::Trim))
        );
        assert_eq!(state.timeline().len(), 2);
    }

    #[test]
    fn test_trim_drag_previews_then_commits() {
        let (mut state, mut media) = editor_with(&[1, 2]);
        state.set_mode(EditMode::Trim);

        // 3s clip across 1000px: 3ms per pixel
        state.drag_trim(0, TrimHandle::Right, -100.0).unwrap();
        let live = state.drag_trim(0, TrimHandle::Right, -200.0).unwrap();
        assert_close(live.right, 2.4);

        let clip = state.timeline().get(0).unwrap();
        assert_eq!(clip.right_trim(), 3.0);
        assert_close(state.timeline().total_duration(), 7.2);
        assert!(state.snapshot().clips[0].is_trimming);

        let applied = state.end_trim_drag(&mut media).unwrap();
        assert_close(applied.bounds.right, 2.4);
        assert_close(state.timeline().get(0).unwrap().right_trim(), 2.4);
        assert_close(state.timeline().total_duration(), 6.6);
        assert!(state.timeline().get(0).unwrap().pending_trim().is_none());
        assert!(state.end_trim_drag(&mut media).is_none());
    }

    #[test]
    fn test_trim_drag_respects_zoom_and_clamps() {
        let (mut state, _media) = editor_with(&[2]);
        state.set_mode(EditMode::Trim);
        for _ in 0..10 {
            state.zoom_in();
        }

        // 4.2s across 2000px
        let live = state.drag_trim(0, TrimHandle::Left, 500.0).unwrap();
        assert_close(live.left, 1.05);

        let live = state.drag_trim(0, TrimHandle::Left, 50_000.0).unwrap();
        assert_eq!(live.left, live.right);

        let live = state.drag_trim(0, TrimHandle::Left, -50_000.0).unwrap();
        assert_eq!(live.left, 0.0);
    }

    #[test]
    fn test_switching_mode_abandons_drag() {
        let (mut state, mut media) = editor_with(&[3]);
        state.set_mode(EditMode::Trim);
        state.drag_trim(0, TrimHandle::Left, 400.0).unwrap();

        state.set_mode(EditMode::DragAndDrop);
        let clip = state.timeline().get(0).unwrap();
        assert_eq!(clip.trim(), TrimBounds::full(5.5));
        assert!(clip.pending_trim().is_none());
        assert!(state.end_trim_drag(&mut media).is_none());
    }

    #[test]
    fn test_reorder_keeps_total() {
        let (mut state, mut media) = editor_with(&[1, 2, 3]);
        let ids: Vec<u32> = state.timeline().iter().map(|c| c.clip.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!(state.reorder(0, 2, &mut media).unwrap());
        let ids: Vec<u32> = state.timeline().iter().map(|c| c.clip.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_close(state.timeline().total_duration(), 12.7);

        assert!(!state.reorder(1, 1, &mut media).unwrap());
    }

    #[test]
    fn test_empty_snapshot_has_placeholder() {
        let (mut state, mut media) = editor();
        assert_eq!(state.play(&mut media), Err(EditorError::EmptyTimeline));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.placeholder.as_deref(), Some("No scenes available"));
        assert_eq!(snapshot.cursor_x, 0.0);
        assert_eq!(snapshot.catalog.len(), 3);
        assert_eq!(snapshot.ruler.len(), 1);
    }

    #[test]
    fn test_snapshot_tracks_cursor() {
        let (mut state, mut media) = editor_with(&[1, 2, 3]);
        state.set_track_width(1270.0);
        state.seek_to_pixel(635.0, &mut media).unwrap();

        let snapshot = state.snapshot();
        assert!(snapshot.placeholder.is_none());
        assert_close(snapshot.cursor.logical_time, 6.35);
        assert_eq!(snapshot.cursor.active_index, Some(1));
        assert_close(snapshot.cursor_x, 635.0);
        assert_eq!(snapshot.ruler.len(), 13);
        assert_eq!(snapshot.clips.len(), 3);
    }

    #[test]
    fn test_toggle_playback() {
        let (mut state, mut media) = editor_with(&[1]);
        state.toggle_playback(&mut media).unwrap();
        assert_eq!(state.playback().state, PlaybackState::Playing);
        state.toggle_playback(&mut media).unwrap();
        assert_eq!(state.playback().state, PlaybackState::Stopped);
    }

    #[test]
    fn test_unusable_widths_from_preferences_use_defaults() {
        let prefs = EditorPreferences {
            track_width_px: 0.0,
            ruler_marker_px: f64::NAN,
            ..EditorPreferences::default()
        };
        let mut state = EditorState::new(ClipCatalog::builtin(), &prefs);
        let mut media = MediaCommandQueue::new();
        assert_eq!(state.track_width(), 1000.0);

        state.drop_scene(1, &mut media).unwrap();
        assert_eq!(state.snapshot().ruler[0].width_px, 50.0);

        state.set_mode(EditMode::Trim);
        let live = state.drag_trim(0, TrimHandle::Right, -100.0).unwrap();
        assert_close(live.right, 2.7);

        state.set_track_width(-5.0);
        assert_eq!(state.track_width(), 1000.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let (state, _media) = editor_with(&[1]);
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["mode"], "dnd");
        assert_eq!(json["clips"][0]["clip_id"], 1);
        assert_eq!(json["cursor"]["state"], "Stopped");
    }
}
