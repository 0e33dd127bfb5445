//! Tauri commands for opening and closing editor windows.

use crate::windows;

/// Open another editor window and return its label.
///
/// Async so the window is not built on the main thread while it is
/// servicing this command.
#[tauri::command]
pub async fn open_window(app: tauri::AppHandle) -> Result<String, String> {
    windows::spawn_window(&app)
        .map(|window| window.label().to_string())
        .map_err(|e| format!("Failed to open window: {e}"))
}

/// Close the calling window. Its session is torn down once it is destroyed.
#[tauri::command]
pub fn close_window(window: tauri::WebviewWindow) -> Result<(), String> {
    window
        .close()
        .map_err(|e| format!("Failed to close window: {e}"))
}
