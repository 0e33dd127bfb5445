//! Application state shared between Tauri commands, window events, and the run loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use cinder_pty::{SessionController, TerminalConfig, WindowLifecycleCoordinator};

/// Global app state managed by Tauri.
///
/// Lock order is `windows` before `sessions` wherever both are held.
pub struct AppState {
    /// One shell session per window, keyed by window label.
    pub sessions: Mutex<SessionController>,
    /// Open-window table driving session teardown.
    pub windows: Mutex<WindowLifecycleCoordinator>,
    /// Monotonically increasing window counter.
    next_window: AtomicU64,
}

impl AppState {
    pub fn new(config: TerminalConfig) -> Self {
        Self {
            sessions: Mutex::new(SessionController::new(config)),
            windows: Mutex::new(WindowLifecycleCoordinator::new()),
            next_window: AtomicU64::new(1),
        }
    }

    /// Allocate a label for a new window. The label doubles as its channel id.
    pub fn next_window_label(&self) -> String {
        format!("window-{}", self.next_window.fetch_add(1, Ordering::Relaxed))
    }
}
