//! Window creation and the lifecycle hooks that tear sessions down.

use std::sync::PoisonError;

use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::state::AppState;

/// Build a new editor window and register it as open.
pub fn spawn_window(app: &AppHandle) -> tauri::Result<WebviewWindow> {
    let state = app.state::<AppState>();
    let label = state.next_window_label();

    let window = WebviewWindowBuilder::new(app, &label, WebviewUrl::App("index.html".into()))
        .title("Cinder")
        .inner_size(800.0, 600.0)
        .min_inner_size(400.0, 300.0)
        .build()?;

    state
        .windows
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .on_window_created(&label);
    log::info!("opened {label}");
    Ok(window)
}

/// A window is gone: kill its shell and forget it.
///
/// Teardown runs even if a lock was poisoned by an earlier panic.
pub fn window_destroyed(app: &AppHandle, label: &str) {
    let state = app.state::<AppState>();
    let mut windows = state.windows.lock().unwrap_or_else(PoisonError::into_inner);
    let mut sessions = state.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    windows.on_window_closed(&mut *sessions, label);
    log::info!("closed {label}, {} window(s) left", windows.open_window_count());
}

/// The application is exiting: kill every shell.
pub fn app_quitting(app: &AppHandle) {
    let state = app.state::<AppState>();
    let mut windows = state.windows.lock().unwrap_or_else(PoisonError::into_inner);
    let mut sessions = state.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    windows.on_app_quitting(&mut *sessions);
}
