// src/lib.rs

pub mod catalog;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod editor;
pub mod error;
pub mod playback;
pub mod preferences;
pub mod projector;
pub mod timeline;
pub mod view;

pub use editor::{EditorEngine, EditorSnapshot, EditorState};
pub use error::EditorError;

#[cfg(feature = "desktop")]
use commands::{
    begin_trim_drag, cancel_trim_drag, drag_trim, drop_scene, end_trim_drag, get_editor_state,
    media_ended, media_time_update, remove_scene, reorder_scenes, seek_track, set_edit_mode,
    set_track_width, toggle_playback, zoom_in, zoom_out,
};

#[cfg(feature = "desktop")]
#[tauri::command]
fn get_editor_preferences(
    prefs: tauri::State<'_, preferences::PreferenceManager>,
) -> preferences::EditorPreferences {
    prefs.get_preferences()
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use preferences::PreferenceManager;
    use tauri::Manager;

    // .env may carry RUST_LOG and the catalog override
    dotenv::dotenv().ok();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_fs::init())
        .setup(|app| {
            // Initialize Logger
            env_logger::init();

            let prefs_manager = PreferenceManager::new(app.handle())?;
            let prefs = prefs_manager.get_preferences();
            let catalog = prefs.load_catalog()?;
            log::info!(
                "🚀 Editor ready: {} scenes, preferences at {:?}",
                catalog.len(),
                prefs_manager.path()
            );

            app.manage(prefs_manager);
            app.manage(EditorEngine::new(EditorState::new(catalog, &prefs)));

            Ok(())
        })
        // Register the commands
        .invoke_handler(tauri::generate_handler![
            get_editor_state,
            get_editor_preferences,
            drop_scene,
            reorder_scenes,
            remove_scene,
            begin_trim_drag,
            drag_trim,
            end_trim_drag,
            cancel_trim_drag,
            set_edit_mode,
            zoom_in,
            zoom_out,
            set_track_width,
            toggle_playback,
            seek_track,
            media_time_update,
            media_ended
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
