// src/view.rs
use crate::preferences::ZoomPreferences;
use serde::{Deserialize, Serialize};

/// Which gestures the track currently accepts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    #[serde(rename = "dnd")]
    DragAndDrop,
    #[serde(rename = "trim")]
    Trim,
}

/// Pixel-per-second density of the ruler and clip boxes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ZoomState {
    level: f64,
    min: f64,
    max: f64,
    step: f64,
}

impl ZoomState {
    /// Inverted or non-finite limits and a non-positive step from a
    /// hand-edited preferences file fall back to the defaults.
    pub fn new(prefs: &ZoomPreferences) -> Self {
        let defaults = ZoomPreferences::default();
        let usable = prefs.min.is_finite() && prefs.max.is_finite() && 0.0 < prefs.min && prefs.min <= prefs.max;
        let (min, max) = if usable { (prefs.min, prefs.max) } else { (defaults.min, defaults.max) };
        let step = if prefs.step.is_finite() && prefs.step > 0.0 { prefs.step } else { defaults.step };
        let initial = if prefs.initial.is_finite() { prefs.initial } else { defaults.initial };
        Self {
            level: initial.clamp(min, max),
            min,
            max,
            step,
        }
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_level(self.level + self.step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_level(self.level - self.step)
    }

    /// Moves to `level`, kept inside `[min, max]`.
    pub fn set_level(&mut self, level: f64) -> f64 {
        if level.is_finite() {
            self.level = level.clamp(self.min, self.max);
        }
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Scales a base pixel width by the current level.
    pub fn scale(&self, px: f64) -> f64 {
        px * self.level
    }
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::new(&ZoomPreferences::default())
    }
}
