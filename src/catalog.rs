// src/catalog.rs
use crate::error::EditorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

pub type ClipId = u32;

/// Longest source clip the catalog accepts (seconds): one day.
pub const MAX_CLIP_DURATION: f64 = 24.0 * 60.0 * 60.0;

/// A source clip the user can drop onto the track. Never mutated once loaded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    pub duration: f64, // Untrimmed length (seconds)
    pub url: String,
}

/// Read-only list of available clips, in display order.
#[derive(Serialize, Clone, Debug)]
#[serde(transparent)]
pub struct ClipCatalog {
    clips: Vec<Arc<Clip>>,
}

impl ClipCatalog {
    /// Rejects non-positive or over-long durations and duplicate ids.
    pub fn new(clips: Vec<Clip>) -> Result<Self, EditorError> {
        let mut seen = HashSet::new();
        for clip in &clips {
            if !clip.duration.is_finite() || clip.duration <= 0.0 {
                return Err(EditorError::InvalidCatalog(format!(
                    "clip {} has non-positive duration {}",
                    clip.id, clip.duration
                )));
            }
            if clip.duration > MAX_CLIP_DURATION {
                return Err(EditorError::InvalidCatalog(format!(
                    "clip {} is longer than {}s ({}s)",
                    clip.id, MAX_CLIP_DURATION, clip.duration
                )));
            }
            if !seen.insert(clip.id) {
                return Err(EditorError::InvalidCatalog(format!(
                    "duplicate clip id {}",
                    clip.id
                )));
            }
        }

        Ok(Self {
            clips: clips.into_iter().map(Arc::new).collect(),
        })
    }

    /// The three sample scenes shipped with the editor.
    pub fn builtin() -> Self {
        let clips = [(1, 3.0), (2, 4.2), (3, 5.5)]
            .into_iter()
            .map(|(id, duration)| {
                Arc::new(Clip {
                    id,
                    name: format!("Scene {}", id),
                    duration,
                    url: format!("/videos/{}.mp4", id),
                })
            })
            .collect();
        Self { clips }
    }

    pub fn from_json(raw: &str) -> Result<Self, EditorError> {
        let clips: Vec<Clip> =
            serde_json::from_str(raw).map_err(|e| EditorError::InvalidCatalog(e.to_string()))?;
        Self::new(clips)
    }

    pub fn from_file(path: &Path) -> Result<Self, EditorError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EditorError::InvalidCatalog(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn get(&self, id: ClipId) -> Result<Arc<Clip>, EditorError> {
        self.clips
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(EditorError::NotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl Default for ClipCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenes() {
        let catalog = ClipCatalog::builtin();
        assert_eq!(catalog.len(), 3);

        let durations: Vec<f64> = catalog.iter().map(|c| c.duration).collect();
        assert_eq!(durations, vec![3.0, 4.2, 5.5]);

        let second = catalog.get(2).unwrap();
        assert_eq!(second.name, "Scene 2");
        assert_eq!(second.url, "/videos/2.mp4");
    }

    #[test]
    fn test_get_missing_clip() {
        let catalog = ClipCatalog::builtin();
        assert_eq!(catalog.get(42).unwrap_err(), EditorError::NotFound(42));
    }

    #[test]
    fn test_from_json() {
        let raw = r#"
        [
            { "id": 7, "name": "Intro", "duration": 2.5, "url": "/videos/intro.mp4" },
            { "id": 9, "name": "Outro", "duration": 6.0, "url": "/videos/outro.mp4" }
        ]
        "#;
        let catalog = ClipCatalog::from_json(raw).expect("valid catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(9).unwrap().name, "Outro");
    }

    #[test]
    fn test_rejects_bad_entries() {
        let zero = vec![Clip {
            id: 1,
            name: "Empty".to_string(),
            duration: 0.0,
            url: "/videos/empty.mp4".to_string(),
        }];
        assert!(matches!(
            ClipCatalog::new(zero),
            Err(EditorError::InvalidCatalog(_))
        ));

        let dup = r#"[
            { "id": 1, "name": "A", "duration": 1.0, "url": "a" },
            { "id": 1, "name": "B", "duration": 2.0, "url": "b" }
        ]"#;
        assert!(ClipCatalog::from_json(dup).is_err());

        let huge = r#"[{ "id": 1, "name": "x", "duration": 1e10, "url": "u" }]"#;
        assert!(matches!(
            ClipCatalog::from_json(huge),
            Err(EditorError::InvalidCatalog(_))
        ));
        let day = format!(r#"[{{ "id": 1, "name": "x", "duration": {}, "url": "u" }}]"#, MAX_CLIP_DURATION);
        assert!(ClipCatalog::from_json(&day).is_ok());
        assert!(ClipCatalog::from_json("not json").is_err());
    }
}
