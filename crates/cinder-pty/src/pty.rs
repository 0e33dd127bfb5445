use std::io::{Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;

use crate::env::LaunchPlan;
use crate::session::Geometry;

/// How long a shell has to exit after the hangup signal before it is forced.
const KILL_GRACE: Duration = Duration::from_millis(500);
const REAP_POLL: Duration = Duration::from_millis(20);

/// Errors from PTY operations.
#[derive(Debug, Error)]
pub enum PtyError {
    #[error("PTY spawn failed: {0}")]
    SpawnFailed(String),
    #[error("PTY I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("PTY resize failed: {0}")]
    ResizeFailed(String),
    #[error("PTY kill failed: {0}")]
    KillFailed(String),
}

/// One shell process attached to a pseudo-terminal.
///
/// Sessions only ever talk to their shell through this trait, which keeps
/// the session logic independent of the OS backend.
pub trait PtyProcess: Send {
    /// Write bytes to the shell's input (user input -> shell).
    fn write(&mut self, data: &[u8]) -> Result<(), PtyError>;

    /// Resize the pseudo-terminal.
    fn resize(&mut self, geometry: Geometry) -> Result<(), PtyError>;

    /// Signal the shell to terminate. Returns once the signal is sent and
    /// never waits for the process to exit.
    fn kill(&mut self) -> Result<(), PtyError>;

    /// Hand out the output stream. Returns `None` once it has been taken.
    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>>;

    /// OS process id of the shell, if known.
    fn process_id(&self) -> Option<u32>;
}

/// Creates [`PtyProcess`]es from a launch plan.
pub trait PtySpawner {
    fn spawn(&self, plan: &LaunchPlan, geometry: Geometry)
        -> Result<Box<dyn PtyProcess>, PtyError>;
}

/// Spawns real shells through `portable-pty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePtySpawner;

impl PtySpawner for NativePtySpawner {
    fn spawn(
        &self,
        plan: &LaunchPlan,
        geometry: Geometry,
    ) -> Result<Box<dyn PtyProcess>, PtyError> {
        let handle = PtyHandle::spawn(plan, geometry)?;
        Ok(Box::new(handle))
    }
}

type SharedChild = Arc<Mutex<Box<dyn Child + Send + Sync>>>;

/// Owns a portable-pty child process, master pair, reader, and writer.
///
/// Killing only delivers the signal. Reaping happens on a `pty-reap-*`
/// thread, which force-kills shells that outlive [`KILL_GRACE`].
pub struct PtyHandle {
    master: Box<dyn MasterPty + Send>,
    reader: Option<Box<dyn Read + Send>>,
    writer: Box<dyn Write + Send>,
    child: SharedChild,
    killer: Box<dyn ChildKiller + Send + Sync>,
    pid: Option<u32>,
    killed: bool,
}

impl PtyHandle {
    /// Spawn the plan's program on a fresh PTY with the given dimensions.
    pub fn spawn(plan: &LaunchPlan, geometry: Geometry) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(pty_size(geometry))
            .map_err(|e| PtyError::SpawnFailed(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&plan.program);
        cmd.args(&plan.args);
        if let Some(cwd) = &plan.cwd {
            cmd.cwd(cwd);
        }
        for (key, value) in &plan.env {
            cmd.env(key, value);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            PtyError::SpawnFailed(format!("failed to spawn {}: {e}", plan.program))
        })?;
        let killer = child.clone_killer();
        let pid = child.process_id();

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to clone reader: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to take writer: {e}")))?;

        Ok(Self {
            master: pair.master,
            reader: Some(reader),
            writer,
            child: Arc::new(Mutex::new(child)),
            killer,
            pid,
            killed: false,
        })
    }
}

impl PtyProcess for PtyHandle {
    fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    fn resize(&mut self, geometry: Geometry) -> Result<(), PtyError> {
        self.master
            .resize(pty_size(geometry))
            .map_err(|e| PtyError::ResizeFailed(format!("{e}")))
    }

    fn kill(&mut self) -> Result<(), PtyError> {
        if self.killed {
            return Ok(());
        }
        self.killed = true;

        // An exited but unreaped child still accepts the signal.
        let signalled = self.killer.kill();

        let child = Arc::clone(&self.child);
        let pid = self.pid;
        thread::Builder::new()
            .name(format!("pty-reap-{}", pid.unwrap_or_default()))
            .spawn(move || reap(&child, pid))?;

        signalled.map_err(|e| PtyError::KillFailed(e.to_string()))
    }

    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
        self.reader.take()
    }

    fn process_id(&self) -> Option<u32> {
        self.pid
    }
}

/// Exit code of the child, or `None` while it is still running.
fn exit_code(child: &SharedChild) -> Option<u32> {
    let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
    match child.try_wait() {
        Ok(Some(status)) => Some(status.exit_code()),
        _ => None,
    }
}

/// Wait out the grace period, then force the child down and collect it.
fn reap(child: &SharedChild, pid: Option<u32>) {
    let deadline = Instant::now() + KILL_GRACE;
    while Instant::now() < deadline {
        if exit_code(child).is_some() {
            log::debug!("reaped shell {pid:?}");
            return;
        }
        thread::sleep(REAP_POLL);
    }

    log::debug!("shell {pid:?} ignored hangup, forcing it");
    let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = child.kill() {
        log::warn!("failed to force-kill shell {pid:?}: {e}");
    }
    if let Err(e) = child.wait() {
        log::warn!("failed to reap shell {pid:?}: {e}");
    }
}

fn pty_size(geometry: Geometry) -> PtySize {
    PtySize {
        rows: geometry.rows,
        cols: geometry.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}
