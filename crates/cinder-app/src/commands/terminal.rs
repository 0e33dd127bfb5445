//! Tauri commands for terminal session management.
//!
//! These commands are invoked from the frontend via `invoke()`. The calling
//! window's label is the session's channel id, so a window can only ever
//! reach its own shell. They are synchronous so Tauri runs them on the main
//! thread, in the order each window sent them.

use tauri::ipc::Channel;
use tauri::Manager;

use crate::ipc::{SessionInfo, TerminalEvent, WindowSink};
use crate::state::AppState;

/// Spawn the calling window's shell and stream its output over `channel`.
///
/// An existing session for the window is torn down first.
#[tauri::command]
pub fn create_session(
    window: tauri::WebviewWindow,
    state: tauri::State<'_, AppState>,
    cols: u16,
    rows: u16,
    channel: Channel<TerminalEvent>,
) -> Result<SessionInfo, String> {
    let label = window.label().to_string();
    let sink = WindowSink::new(window.app_handle().clone(), label.clone(), channel);

    let mut sessions = state.sessions.lock().map_err(|e| format!("Lock error: {e}"))?;
    let geometry = sessions
        .create_session(&label, cols, rows, Box::new(sink))
        .map_err(|e| format!("Failed to create terminal session: {e}"))?;

    Ok(SessionInfo {
        cols: geometry.cols,
        rows: geometry.rows,
        pid: sessions.process_id(&label),
    })
}

/// Write user input to the calling window's shell. Dropped if it has none.
#[tauri::command]
pub fn write_input(
    window: tauri::WebviewWindow,
    state: tauri::State<'_, AppState>,
    data: String,
) -> Result<(), String> {
    let mut sessions = state.sessions.lock().map_err(|e| format!("Lock error: {e}"))?;
    sessions
        .write_input(window.label(), data.as_bytes())
        .map_err(|e| format!("Write error: {e}"))
}

/// Resize the calling window's PTY.
#[tauri::command]
pub fn resize_session(
    window: tauri::WebviewWindow,
    state: tauri::State<'_, AppState>,
    cols: u16,
    rows: u16,
) -> Result<(), String> {
    let mut sessions = state.sessions.lock().map_err(|e| format!("Lock error: {e}"))?;
    sessions
        .resize(window.label(), cols, rows)
        .map_err(|e| format!("Resize error: {e}"))
}

/// Kill the calling window's shell. Returns whether there was one.
#[tauri::command]
pub fn destroy_session(
    window: tauri::WebviewWindow,
    state: tauri::State<'_, AppState>,
) -> Result<bool, String> {
    let mut sessions = state.sessions.lock().map_err(|e| format!("Lock error: {e}"))?;
    Ok(sessions.destroy_session(window.label()))
}
