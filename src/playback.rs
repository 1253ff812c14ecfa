// src/playback.rs
use crate::error::EditorError;
use crate::projector::{self, Projection};
use crate::timeline::Timeline;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// The preview `<video>` as seen from the editor. Real time only enters the
/// editor through the events fed back into [`PlaybackController`].
pub trait MediaElement {
    fn load(&mut self, url: &str);
    fn seek(&mut self, time: f64);
    fn play(&mut self);
    fn pause(&mut self);
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaCommand {
    Load { url: String },
    Seek { time: f64 },
    Play,
    Pause,
}

/// Records media calls so they can be shipped to the page in one batch.
#[derive(Debug, Default, Clone)]
pub struct MediaCommandQueue {
    commands: Vec<MediaCommand>,
}

impl MediaCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[MediaCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<MediaCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl MediaElement for MediaCommandQueue {
    fn load(&mut self, url: &str) {
        self.commands.push(MediaCommand::Load {
            url: url.to_string(),
        });
    }

    fn seek(&mut self, time: f64) {
        self.commands.push(MediaCommand::Seek { time });
    }

    fn play(&mut self) {
        self.commands.push(MediaCommand::Play);
    }

    fn pause(&mut self) {
        self.commands.push(MediaCommand::Pause);
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct PlaybackCursor {
    pub logical_time: f64,
    pub active_index: Option<usize>,
    pub state: PlaybackState,
}

/// What a media event did to the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Progressed,
    Advanced { to: usize },
    Finished,
    Ignored,
}

/// Drives the media element across the trimmed clips of a timeline.
#[derive(Debug, Default)]
pub struct PlaybackController {
    cursor: PlaybackCursor,
    // Placement currently loaded in the media element.
    active_placement: Option<String>,
    // Last known position inside that placement's media.
    media_position: f64,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn logical_time(&self) -> f64 {
        self.cursor.logical_time
    }

    pub fn active_index(&self) -> Option<usize> {
        self.cursor.active_index
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.state == PlaybackState::Playing
    }

    pub fn play(&mut self, timeline: &Timeline, media: &mut dyn MediaElement) -> Result<(), EditorError> {
        self.reconcile(timeline, media);
        let index = self.cursor.active_index.ok_or(EditorError::EmptyTimeline)?;
        if self.is_playing() {
            return Ok(());
        }

        // Pressing play on the final instant starts over.
        let (index, position) = if self.cursor.logical_time >= timeline.total_duration() && index + 1 == timeline.len() {
            (0, timeline.get(0).map_or(0.0, |c| c.left_trim()))
        } else {
            (index, self.media_position)
        };

        self.activate(timeline, index, position, media);
        media.play();
        self.cursor.state = PlaybackState::Playing;

        info!(
            "▶️ Playing clip {} from {:.2}s (media {:.2}s)",
            index, self.cursor.logical_time, self.media_position
        );
        Ok(())
    }

    /// Pauses in place; index and time are kept.
    pub fn pause(&mut self, media: &mut dyn MediaElement) {
        if !self.is_playing() {
            return;
        }
        media.pause();
        self.cursor.state = PlaybackState::Stopped;
        info!("⏸️ Paused at {:.2}s", self.cursor.logical_time);
    }

    pub fn toggle(&mut self, timeline: &Timeline, media: &mut dyn MediaElement) -> Result<(), EditorError> {
        if self.is_playing() {
            self.pause(media);
            Ok(())
        } else {
            self.play(timeline, media)
        }
    }

    /// Moves the playhead to `logical_time` without changing play state.
    pub fn seek(
        &mut self,
        timeline: &Timeline,
        media: &mut dyn MediaElement,
        logical_time: f64,
    ) -> Result<(), EditorError> {
        self.reconcile(timeline, media);
        let Projection {
            active_index,
            media_offset,
            ..
        } = projector::project(timeline, logical_time).ok_or(EditorError::EmptyTimeline)?;

        self.activate(timeline, active_index, media_offset, media);
        debug!(
            "⏩ Seek to {:.2}s -> clip {} media {:.2}s",
            self.cursor.logical_time, active_index, media_offset
        );
        Ok(())
    }

    /// Seek from a click `px` pixels into a track `track_width` wide.
    pub fn seek_to_pixel(
        &mut self,
        timeline: &Timeline,
        media: &mut dyn MediaElement,
        px: f64,
        track_width: f64,
    ) -> Result<(), EditorError> {
        let t = projector::time_at_pixel(timeline, px, track_width);
        self.seek(timeline, media, t)
    }

    /// Media element reported `current_time` seconds into the active clip's media.
    pub fn on_time_update(
        &mut self,
        timeline: &Timeline,
        media: &mut dyn MediaElement,
        current_time: f64,
    ) -> PlaybackEvent {
        if !current_time.is_finite() {
            return PlaybackEvent::Ignored;
        }
        self.reconcile(timeline, media);
        let Some(index) = self.cursor.active_index else {
            return PlaybackEvent::Ignored;
        };
        let Some(active) = timeline.get(index) else {
            return PlaybackEvent::Ignored;
        };

        if self.is_playing() && current_time >= active.right_trim() {
            return self.boundary_reached(timeline, index, media);
        }

        let within = current_time.clamp(active.left_trim(), active.right_trim());
        self.media_position = within;
        self.cursor.logical_time = timeline.start_of(index) + (within - active.left_trim());
        PlaybackEvent::Progressed
    }

    /// The media element ran off the end of its source.
    pub fn on_ended(&mut self, timeline: &Timeline, media: &mut dyn MediaElement) -> PlaybackEvent {
        self.reconcile(timeline, media);
        match self.cursor.active_index {
            Some(index) if self.is_playing() => self.boundary_reached(timeline, index, media),
            _ => PlaybackEvent::Ignored,
        }
    }

    /// Re-validates the cursor after the timeline changed. The active clip is
    /// followed by placement id across reorders; if it is gone the old index
    /// is clamped onto the shorter track.
    pub fn reconcile(&mut self, timeline: &Timeline, media: &mut dyn MediaElement) {
        if timeline.is_empty() {
            if self.is_playing() {
                media.pause();
                info!("⏹️ Track emptied while playing");
            }
            *self = Self::default();
            return;
        }

        let followed = self
            .active_placement
            .as_deref()
            .and_then(|id| timeline.position_of(id));

        match followed.and_then(|index| timeline.get(index).map(|c| (index, c))) {
            Some((index, active)) => {
                let within = self.media_position.clamp(active.left_trim(), active.right_trim());
                if within != self.media_position {
                    // Trim moved past the playhead
                    media.seek(within);
                    self.media_position = within;
                }
                self.cursor.active_index = Some(index);
                self.cursor.logical_time = timeline.start_of(index) + (within - active.left_trim());
            }
            None => {
                let index = self
                    .cursor
                    .active_index
                    .map_or(0, |i| i.min(timeline.len() - 1));
                let left = timeline.get(index).map_or(0.0, |c| c.left_trim());
                self.activate(timeline, index, left, media);
            }
        }
    }

    fn boundary_reached(&mut self, timeline: &Timeline, index: usize, media: &mut dyn MediaElement) -> PlaybackEvent {
        let next = (index + 1..timeline.len())
            .find(|&i| timeline.get(i).map_or(false, |c| !c.is_degenerate()));

        match next.and_then(|i| timeline.get(i).map(|c| (i, c.left_trim()))) {
            Some((next, left)) => {
                self.activate(timeline, next, left, media);
                info!("⏭️ Advanced to clip {} at {:.2}s", next, self.cursor.logical_time);
                PlaybackEvent::Advanced { to: next }
            }
            None => {
                media.pause();
                self.cursor.state = PlaybackState::Stopped;
                let left = timeline.get(0).map_or(0.0, |c| c.left_trim());
                self.activate(timeline, 0, left, media);
                info!("⏹️ End of sequence, rewound to start");
                PlaybackEvent::Finished
            }
        }
    }

    /// Points the cursor and the media element at `position` inside clip `index`.
    fn activate(&mut self, timeline: &Timeline, index: usize, position: f64, media: &mut dyn MediaElement) {
        let Some(clip) = timeline.get(index) else {
            return;
        };
        let position = position.clamp(clip.left_trim(), clip.right_trim());

        let switched = self.active_placement.as_deref() != Some(clip.placement_id.as_str());
        if switched {
            media.load(&clip.clip.url);
            self.active_placement = Some(clip.placement_id.clone());
        }
        if switched || position != self.media_position {
            media.seek(position);
        }
        if switched && self.is_playing() {
            // A fresh source starts paused
            media.play();
        }

        self.media_position = position;
        self.cursor.active_index = Some(index);
        self.cursor.logical_time = timeline.start_of(index) + (position - clip.left_trim());
    }
}
