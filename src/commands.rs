// src/commands.rs
use crate::catalog::ClipId;
use crate::editor::{EditorEngine, EditorSnapshot, EditorState, TrimHandle};
use crate::error::EditorError;
use crate::playback::{MediaCommandQueue, PlaybackEvent};
use crate::preferences::PreferenceManager;
use crate::view::EditMode;
use log::{info, warn};
use std::sync::MutexGuard;
use tauri::{AppHandle, Emitter, State};

// Lock the editor, run one edit against a fresh media queue, then push the
// queued media calls and the new snapshot to the page.
fn apply<T>(
    app: &AppHandle,
    engine: &State<'_, EditorEngine>,
    edit: impl FnOnce(&mut EditorState, &mut MediaCommandQueue) -> T,
) -> Result<(T, EditorSnapshot), String> {
    let mut state: MutexGuard<'_, EditorState> =
        engine.state.lock().map_err(|_| "Failed to lock state")?;
    let mut media = MediaCommandQueue::new();

    let result = edit(&mut *state, &mut media);
    let snapshot = state.snapshot();
    drop(state);

    if !media.is_empty() {
        app.emit("MEDIA_COMMAND", media.drain())
            .map_err(|e| e.to_string())?;
    }
    app.emit("STATE_UPDATE", &snapshot)
        .map_err(|e| e.to_string())?;

    Ok((result, snapshot))
}

// Failures the page should never see: logged, then the current state is returned.
fn tolerate(result: Result<impl Sized, EditorError>, what: &str) {
    if let Err(e) = result {
        warn!("⚠️ {} ignored: {}", what, e);
    }
}

// --- COMMAND 1: Get Current State ---
// The frontend calls this to know what to draw.
#[tauri::command]
pub fn get_editor_state(engine: State<'_, EditorEngine>) -> Result<EditorSnapshot, String> {
    let state = engine.state.lock().map_err(|_| "Failed to lock state")?;
    Ok(state.snapshot())
}

// --- COMMAND 2: Track Edits ---
// Drop a catalog scene onto the track. An unknown id leaves the track as is.
#[tauri::command]
pub fn drop_scene(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    clip_id: ClipId,
) -> Result<EditorSnapshot, String> {
    info!("➡️ Received drop for clip {}", clip_id);
    let (result, snapshot) = apply(&app, &engine, |state, media| state.drop_scene(clip_id, media))?;
    tolerate(result, "Drop");
    Ok(snapshot)
}

#[tauri::command]
pub fn reorder_scenes(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    from_index: usize,
    to_index: usize,
) -> Result<EditorSnapshot, String> {
    let (result, snapshot) = apply(&app, &engine, |state, media| {
        state.reorder(from_index, to_index, media)
    })?;
    tolerate(result, "Reorder");
    Ok(snapshot)
}

#[tauri::command]
pub fn remove_scene(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    index: usize,
) -> Result<EditorSnapshot, String> {
    let (_, snapshot) = apply(&app, &engine, |state, media| state.remove(index, media))?;
    Ok(snapshot)
}

// --- COMMAND 3: Trim Handles ---
#[tauri::command]
pub fn begin_trim_drag(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    index: usize,
    handle: TrimHandle,
) -> Result<EditorSnapshot, String> {
    let (result, snapshot) = apply(&app, &engine, |state, _| state.begin_trim_drag(index, handle))?;
    tolerate(result, "Trim start");
    Ok(snapshot)
}

// Fired on every pointer move while a handle is held.
#[tauri::command]
pub fn drag_trim(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    index: usize,
    handle: TrimHandle,
    delta_pixels: f64,
) -> Result<EditorSnapshot, String> {
    let (result, snapshot) = apply(&app, &engine, |state, _| {
        state.drag_trim(index, handle, delta_pixels)
    })?;
    tolerate(result, "Trim drag");
    Ok(snapshot)
}

#[tauri::command]
pub fn end_trim_drag(app: AppHandle, engine: State<'_, EditorEngine>) -> Result<EditorSnapshot, String> {
    let (_, snapshot) = apply(&app, &engine, |state, media| state.end_trim_drag(media))?;
    Ok(snapshot)
}

#[tauri::command]
pub fn cancel_trim_drag(app: AppHandle, engine: State<'_, EditorEngine>) -> Result<EditorSnapshot, String> {
    let (_, snapshot) = apply(&app, &engine, |state, _| state.cancel_trim_drag())?;
    Ok(snapshot)
}

// --- COMMAND 4: View ---
#[tauri::command]
pub fn set_edit_mode(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    mode: EditMode,
) -> Result<EditorSnapshot, String> {
    let (_, snapshot) = apply(&app, &engine, |state, _| state.set_mode(mode))?;
    Ok(snapshot)
}

// The zoom level is remembered so the next session opens at the same scale.
fn remember_zoom(prefs: &State<'_, PreferenceManager>, level: f64) {
    tolerate(prefs.update(|p| p.zoom.initial = level), "Saving zoom level");
}

#[tauri::command]
pub fn zoom_in(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    prefs: State<'_, PreferenceManager>,
) -> Result<EditorSnapshot, String> {
    let (level, snapshot) = apply(&app, &engine, |state, _| state.zoom_in())?;
    remember_zoom(&prefs, level);
    Ok(snapshot)
}

#[tauri::command]
pub fn zoom_out(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    prefs: State<'_, PreferenceManager>,
) -> Result<EditorSnapshot, String> {
    let (level, snapshot) = apply(&app, &engine, |state, _| state.zoom_out())?;
    remember_zoom(&prefs, level);
    Ok(snapshot)
}

#[tauri::command]
pub fn set_track_width(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    width: f64,
) -> Result<EditorSnapshot, String> {
    let (_, snapshot) = apply(&app, &engine, |state, _| state.set_track_width(width))?;
    Ok(snapshot)
}

// --- COMMAND 5: Playback ---
#[tauri::command]
pub fn toggle_playback(app: AppHandle, engine: State<'_, EditorEngine>) -> Result<EditorSnapshot, String> {
    let (result, snapshot) = apply(&app, &engine, |state, media| state.toggle_playback(media))?;
    tolerate(result, "Play");
    Ok(snapshot)
}

#[tauri::command]
pub fn seek_track(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    click_x: f64,
) -> Result<EditorSnapshot, String> {
    let (result, snapshot) = apply(&app, &engine, |state, media| state.seek_to_pixel(click_x, media))?;
    tolerate(result, "Seek");
    Ok(snapshot)
}

// --- COMMAND 6: Media Element Events ---
// The page forwards the <video> element's timeupdate/ended events here.
#[tauri::command]
pub fn media_time_update(
    app: AppHandle,
    engine: State<'_, EditorEngine>,
    current_time: f64,
) -> Result<EditorSnapshot, String> {
    let (event, snapshot) = apply(&app, &engine, |state, media| {
        state.media_time_update(current_time, media)
    })?;
    if let PlaybackEvent::Advanced { .. } | PlaybackEvent::Finished = event {
        info!("🎬 {:?}", event);
    }
    Ok(snapshot)
}

#[tauri::command]
pub fn media_ended(app: AppHandle, engine: State<'_, EditorEngine>) -> Result<EditorSnapshot, String> {
    let (_, snapshot) = apply(&app, &engine, |state, media| state.media_ended(media))?;
    Ok(snapshot)
}
