use crate::catalog::ClipCatalog;
use crate::error::EditorError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Overrides `catalog_path` when set (read after .env is loaded).
pub const CATALOG_ENV_VAR: &str = "SCENETRACK_CATALOG";

// --- DATA STRUCTURES ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EditorPreferences {
    pub track_width_px: f64,
    pub ruler_marker_px: f64,
    pub zoom: ZoomPreferences,
    pub catalog_path: Option<PathBuf>,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            track_width_px: 1000.0,
            ruler_marker_px: 50.0,
            zoom: ZoomPreferences::default(),
            catalog_path: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ZoomPreferences {
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomPreferences {
    fn default() -> Self {
        Self {
            initial: 1.0,
            min: 0.5,
            max: 2.0,
            step: 0.1,
        }
    }
}

impl EditorPreferences {
    /// Loads the clip catalog named by the env override or `catalog_path`,
    /// falling back to the built-in scenes.
    pub fn load_catalog(&self) -> Result<ClipCatalog, EditorError> {
        let path = std::env::var_os(CATALOG_ENV_VAR)
            .map(PathBuf::from)
            .or_else(|| self.catalog_path.clone());

        match path {
            Some(path) => {
                let catalog = ClipCatalog::from_file(&path)?;
                info!("📚 Loaded {} clips from {:?}", catalog.len(), path);
                Ok(catalog)
            }
            None => Ok(ClipCatalog::builtin()),
        }
    }
}

// --- MANAGER ---

pub struct PreferenceManager {
    preferences: Mutex<EditorPreferences>,
    file_path: Option<PathBuf>,
}

impl PreferenceManager {
    #[cfg(feature = "desktop")]
    pub fn new(app_handle: &tauri::AppHandle) -> Result<Self, EditorError> {
        use tauri::Manager;

        let app_dir = app_handle
            .path()
            .app_config_dir()
            .map_err(|e| EditorError::Preferences(e.to_string()))?;

        // Ensure config dir exists
        if !app_dir.exists() {
            if let Err(e) = fs::create_dir_all(&app_dir) {
                warn!("⚠️ Could not create {:?}: {}", app_dir, e);
            }
        }

        Ok(Self::load(app_dir.join("preferences.json")))
    }

    /// Reads `path`; a missing or unreadable file yields the defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let file_path = path.into();

        let preferences = match fs::read_to_string(&file_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("⚠️ Ignoring malformed {:?}: {}", file_path, e);
                EditorPreferences::default()
            }),
            Err(_) => EditorPreferences::default(),
        };

        Self {
            preferences: Mutex::new(preferences),
            file_path: Some(file_path),
        }
    }

    pub fn new_in_memory() -> Self {
        Self {
            preferences: Mutex::new(EditorPreferences::default()),
            file_path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn save(&self) -> Result<(), EditorError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let json = {
            let prefs = self.lock()?;
            serde_json::to_string_pretty(&*prefs)
                .map_err(|e| EditorError::Preferences(e.to_string()))?
        };
        fs::write(path, json).map_err(|e| EditorError::Preferences(e.to_string()))
    }

    pub fn update(&self, f: impl FnOnce(&mut EditorPreferences)) -> Result<(), EditorError> {
        {
            let mut prefs = self.lock()?;
            f(&mut prefs);
        }
        // Lock is released before touching the disk
        self.save()
    }

    pub fn get_preferences(&self) -> EditorPreferences {
        match self.preferences.lock() {
            Ok(prefs) => prefs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, EditorPreferences>, EditorError> {
        self.preferences
            .lock()
            .map_err(|_| EditorError::Preferences("Failed to lock preferences".to_string()))
    }
}
