//! Window lifecycle events driving session teardown.

use std::collections::BTreeSet;

use crate::channel::ChannelId;
use crate::controller::SessionController;
use crate::pty::PtySpawner;

/// Tracks which windows are open and disposes a window's session when it
/// closes, plus every session when the application quits.
#[derive(Debug, Default)]
pub struct WindowLifecycleCoordinator {
    open_windows: BTreeSet<ChannelId>,
}

impl WindowLifecycleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new window. Returns `false` if it was already known.
    pub fn on_window_created(&mut self, channel_id: &str) -> bool {
        let inserted = self.open_windows.insert(channel_id.to_string());
        if inserted {
            log::debug!("window {channel_id} opened");
        }
        inserted
    }

    /// Forget the window and tear down its session, if any. Idempotent.
    pub fn on_window_closed<S: PtySpawner>(
        &mut self,
        controller: &mut SessionController<S>,
        channel_id: &str,
    ) {
        if !self.open_windows.remove(channel_id) {
            log::debug!("close for untracked window {channel_id}");
        }
        controller.destroy_session(channel_id);
    }

    /// Tear down every session and clear the window table. Returns the
    /// number of sessions disposed.
    pub fn on_app_quitting<S: PtySpawner>(&mut self, controller: &mut SessionController<S>) -> usize {
        let disposed = controller.shutdown_all();
        self.open_windows.clear();
        disposed
    }

    pub fn is_window_open(&self, channel_id: &str) -> bool {
        self.open_windows.contains(channel_id)
    }

    pub fn open_window_count(&self) -> usize {
        self.open_windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerminalConfig;
    use crate::env::Platform;
    use crate::testing::{FakeSpawner, RecordingSink};
    use std::time::Duration;

    fn setup() -> (
        WindowLifecycleCoordinator,
        SessionController<FakeSpawner>,
        FakeSpawner,
    ) {
        let spawner = FakeSpawner::new();
        let controller =
            SessionController::with_spawner(spawner.clone(), TerminalConfig::default(), Platform::Unix);
        (WindowLifecycleCoordinator::new(), controller, spawner)
    }

    #[test]
    fn test_window_table_tracks_open_windows() {
        let (mut windows, _, _) = setup();
        assert!(windows.on_window_created("win-1"));
        assert!(!windows.on_window_created("win-1"));
        assert!(windows.on_window_created("win-2"));
        assert_eq!(windows.open_window_count(), 2);
        assert!(windows.is_window_open("win-2"));
    }

    #[test]
    fn test_window_close_disposes_only_its_session() {
        let (mut windows, mut ctl, spawner) = setup();
        let sink = RecordingSink::new();
        windows.on_window_created("win-1");
        windows.on_window_created("win-2");
        ctl.create_session("win-1", 80, 24, sink.boxed()).unwrap();
        ctl.create_session("win-2", 80, 24, RecordingSink::new().boxed()).unwrap();

        windows.on_window_closed(&mut ctl, "win-1");

        assert!(!windows.is_window_open("win-1"));
        assert!(!ctl.has_session("win-1"));
        assert!(ctl.has_session("win-2"));
        assert!(spawner.shell(0).is_killed());
        assert!(!spawner.shell(1).is_killed());

        spawner.shell(0).emit(b"ghost output\n");
        std::thread::sleep(Duration::from_millis(50));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_window_close_without_session() {
        let (mut windows, mut ctl, _) = setup();
        windows.on_window_created("win-3");
        windows.on_window_closed(&mut ctl, "win-3");
        windows.on_window_closed(&mut ctl, "win-3");
        assert_eq!(windows.open_window_count(), 0);
        assert_eq!(ctl.session_count(), 0);
    }

    #[test]
    fn test_app_quitting_sweeps_everything() {
        let (mut windows, mut ctl, spawner) = setup();
        windows.on_window_created("win-1");
        windows.on_window_created("win-2");
        let sink_a = RecordingSink::new();
        let sink_b = RecordingSink::new();
        ctl.create_session("win-1", 80, 24, sink_a.boxed()).unwrap();
        ctl.create_session("win-2", 80, 24, sink_b.boxed()).unwrap();
        spawner.shell(0).fail_kill();

        assert_eq!(windows.on_app_quitting(&mut ctl), 2);

        assert_eq!(ctl.session_count(), 0);
        assert_eq!(windows.open_window_count(), 0);
        assert!(spawner.shell(0).is_killed());
        assert!(spawner.shell(1).is_killed());

        spawner.shell(0).emit(b"after quit\n");
        spawner.shell(1).emit(b"after quit\n");
        std::thread::sleep(Duration::from_millis(50));
        assert!(sink_a.events().is_empty());
        assert!(sink_b.events().is_empty());
    }
}
