//! Create/write/resize/destroy protocol for per-window shell sessions.
//!
//! Every control request names the channel it came from. Output of a
//! session is only ever delivered to the sink supplied when that channel's
//! session was created, so one window can never see another window's shell.

use crate::channel::OutputSink;
use crate::config::TerminalConfig;
use crate::env::{HostEnv, LaunchPlan, Platform};
use crate::pty::{NativePtySpawner, PtyError, PtySpawner};
use crate::registry::SessionRegistry;
use crate::session::{Geometry, Session};

pub struct SessionController<S = NativePtySpawner> {
    registry: SessionRegistry,
    spawner: S,
    config: TerminalConfig,
    platform: Platform,
}

impl SessionController<NativePtySpawner> {
    /// Controller that launches real shells for the current platform.
    pub fn new(config: TerminalConfig) -> Self {
        Self::with_spawner(NativePtySpawner, config, Platform::current())
    }
}

impl<S: PtySpawner> SessionController<S> {
    pub fn with_spawner(spawner: S, config: TerminalConfig, platform: Platform) -> Self {
        Self {
            registry: SessionRegistry::new(),
            spawner,
            config,
            platform,
        }
    }

    /// Spawn a shell for `channel_id` and stream its output to `sink`.
    ///
    /// A session already bound to the channel is disposed first. A zero
    /// dimension falls back to the default geometry. On spawn failure the
    /// channel is left without a session.
    pub fn create_session(
        &mut self,
        channel_id: &str,
        cols: u16,
        rows: u16,
        sink: Box<dyn OutputSink>,
    ) -> Result<Geometry, PtyError> {
        if self.destroy_session(channel_id) {
            log::warn!("replaced existing session for {channel_id}");
        }

        let geometry = Geometry::or_default(cols, rows);
        let host = HostEnv::capture(self.platform);
        let plan = LaunchPlan::build(&self.config, &host, self.platform);

        let process = self.spawner.spawn(&plan, geometry).map_err(|e| {
            log::error!("failed to start {} for {channel_id}: {e}", plan.program);
            e
        })?;
        let session = Session::start(channel_id.to_string(), process, geometry, sink)?;

        log::info!(
            "started {} for {channel_id} at {}x{} (pid {:?})",
            plan.program,
            geometry.cols,
            geometry.rows,
            session.process_id()
        );
        self.registry.put(channel_id, session);
        Ok(geometry)
    }

    /// Forward input to the channel's shell. Input for a channel without a
    /// session is dropped.
    pub fn write_input(&mut self, channel_id: &str, data: &[u8]) -> Result<(), PtyError> {
        match self.registry.get_mut(channel_id) {
            Some(session) => session.write_input(data),
            None => {
                log::trace!("dropping {} input bytes for {channel_id}: no session", data.len());
                Ok(())
            }
        }
    }

    /// Resize the channel's PTY. Requests without a session, or with a zero
    /// dimension, are dropped.
    pub fn resize(&mut self, channel_id: &str, cols: u16, rows: u16) -> Result<(), PtyError> {
        let Some(session) = self.registry.get_mut(channel_id) else {
            log::trace!("dropping resize for {channel_id}: no session");
            return Ok(());
        };
        let Some(geometry) = Geometry::new(cols, rows) else {
            log::debug!("ignoring {cols}x{rows} resize for {channel_id}");
            return Ok(());
        };
        session.resize(geometry)
    }

    /// Tear down the channel's session. Returns whether there was one.
    ///
    /// Kill failures are logged; the entry is removed regardless.
    pub fn destroy_session(&mut self, channel_id: &str) -> bool {
        let Some(mut session) = self.registry.remove(channel_id) else {
            return false;
        };
        match session.dispose() {
            Ok(()) => log::info!("closed session for {channel_id}"),
            Err(e) => log::warn!("session for {channel_id} removed, but kill failed: {e}"),
        }
        true
    }

    /// Dispose every session. Never fails; returns how many were disposed.
    pub fn shutdown_all(&mut self) -> usize {
        let mut disposed = 0;
        self.registry.for_each(|channel_id, session| {
            if let Err(e) = session.dispose() {
                log::warn!("shutdown: kill failed for {channel_id}: {e}");
            }
            disposed += 1;
        });
        self.registry.drain();
        log::info!("shut down {disposed} terminal session(s)");
        disposed
    }

    pub fn has_session(&self, channel_id: &str) -> bool {
        self.registry.contains(channel_id)
    }

    pub fn geometry(&self, channel_id: &str) -> Option<Geometry> {
        self.registry.get(channel_id).map(Session::geometry)
    }

    pub fn process_id(&self, channel_id: &str) -> Option<u32> {
        self.registry.get(channel_id).and_then(Session::process_id)
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.registry.channel_ids()
    }
}
