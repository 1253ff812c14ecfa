// src/error.rs
use crate::catalog::ClipId;
use crate::view::EditMode;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum EditorError {
    #[error("Clip {0} not found in catalog")]
    NotFound(ClipId),
    #[error("Trim [{left}, {right}] outside [0, {duration}] for clip '{placement_id}'")]
    Range {
        placement_id: String,
        left: f64,
        right: f64,
        duration: f64,
    },
    #[error("Index {index} out of range for timeline of {len} clips")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("No scenes available")]
    EmptyTimeline,
    #[error("Not allowed in {0:?} mode")]
    ModeLocked(EditMode),
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("Preferences error: {0}")]
    Preferences(String),
}
