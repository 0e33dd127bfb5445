//! In-memory shells and sinks for exercising sessions without a real PTY.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::channel::{OutputSink, SessionEvent};
use crate::env::LaunchPlan;
use crate::pty::{PtyError, PtyProcess, PtySpawner};
use crate::session::Geometry;

/// Written by a fake shell while it is being killed.
pub const FAREWELL: &[u8] = b"<killed>";

/// Poll `cond` until it holds or two seconds pass.
pub fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Blocking reader fed chunk by chunk from a channel; EOF once every sender is gone.
pub struct ChannelReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl ChannelReader {
    pub fn new() -> (Self, Sender<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        let reader = Self {
            rx,
            pending: Vec::new(),
            pos: 0,
        };
        (reader, tx)
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.pending.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[derive(Default)]
struct FakeState {
    input: Vec<u8>,
    geometry: Option<Geometry>,
    resizes: usize,
    kills: usize,
    fail_writes: bool,
    fail_resize: bool,
    fail_kill: bool,
    output: Option<Sender<Vec<u8>>>,
}

/// Test-side handle onto one fake shell.
#[derive(Clone)]
pub struct FakeShell {
    state: Arc<Mutex<FakeState>>,
}

impl FakeShell {
    /// Make the shell print `data`.
    pub fn emit(&self, data: &[u8]) {
        if let Some(tx) = &self.state.lock().unwrap().output {
            let _ = tx.send(data.to_vec());
        }
    }

    /// Close the shell's output stream, as if it exited on its own.
    pub fn hang_up(&self) {
        self.state.lock().unwrap().output = None;
    }

    pub fn input(&self) -> Vec<u8> {
        self.state.lock().unwrap().input.clone()
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.state.lock().unwrap().geometry
    }

    pub fn resize_count(&self) -> usize {
        self.state.lock().unwrap().resizes
    }

    pub fn kill_count(&self) -> usize {
        self.state.lock().unwrap().kills
    }

    pub fn is_killed(&self) -> bool {
        self.kill_count() > 0
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    pub fn fail_resize(&self) {
        self.state.lock().unwrap().fail_resize = true;
    }

    pub fn fail_kill(&self) {
        self.state.lock().unwrap().fail_kill = true;
    }
}

pub struct FakeProcess {
    state: Arc<Mutex<FakeState>>,
    reader: Option<ChannelReader>,
    pid: u32,
}

impl PtyProcess for FakeProcess {
    fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "shell gone").into());
        }
        state.input.extend_from_slice(data);
        Ok(())
    }

    fn resize(&mut self, geometry: Geometry) -> Result<(), PtyError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_resize {
            return Err(PtyError::ResizeFailed("fake resize failure".to_string()));
        }
        state.geometry = Some(geometry);
        state.resizes += 1;
        Ok(())
    }

    fn kill(&mut self) -> Result<(), PtyError> {
        let mut state = self.state.lock().unwrap();
        state.kills += 1;
        if let Some(tx) = &state.output {
            let _ = tx.send(FAREWELL.to_vec());
        }
        if state.fail_kill {
            return Err(PtyError::KillFailed("fake kill failure".to_string()));
        }
        Ok(())
    }

    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
        self.reader
            .take()
            .map(|reader| Box::new(reader) as Box<dyn Read + Send>)
    }

    fn process_id(&self) -> Option<u32> {
        Some(self.pid)
    }
}

#[derive(Default)]
struct SpawnerState {
    shells: Vec<FakeShell>,
    plans: Vec<LaunchPlan>,
    fail_next: bool,
}

/// Spawner handing out [`FakeProcess`]es; clones share the same record.
#[derive(Clone, Default)]
pub struct FakeSpawner {
    state: Arc<Mutex<SpawnerState>>,
    next_pid: Arc<AtomicU32>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a fake shell directly, bypassing a launch plan.
    pub fn spawn_process(&self) -> Box<dyn PtyProcess> {
        self.make_process(Geometry::default())
    }

    pub fn shell(&self, index: usize) -> FakeShell {
        self.state.lock().unwrap().shells[index].clone()
    }

    pub fn plan(&self, index: usize) -> LaunchPlan {
        self.state.lock().unwrap().plans[index].clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.state.lock().unwrap().shells.len()
    }

    pub fn fail_next_spawn(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    fn make_process(&self, geometry: Geometry) -> Box<dyn PtyProcess> {
        let (reader, tx) = ChannelReader::new();
        let state = Arc::new(Mutex::new(FakeState {
            geometry: Some(geometry),
            output: Some(tx),
            ..FakeState::default()
        }));
        self.state.lock().unwrap().shells.push(FakeShell {
            state: Arc::clone(&state),
        });
        Box::new(FakeProcess {
            state,
            reader: Some(reader),
            pid: 1000 + self.next_pid.fetch_add(1, Ordering::Relaxed),
        })
    }
}

impl PtySpawner for FakeSpawner {
    fn spawn(
        &self,
        plan: &LaunchPlan,
        geometry: Geometry,
    ) -> Result<Box<dyn PtyProcess>, PtyError> {
        {
            let mut state = self.state.lock().unwrap();
            if std::mem::take(&mut state.fail_next) {
                return Err(PtyError::SpawnFailed(format!("{}: not found", plan.program)));
            }
            state.plans.push(plan.clone());
        }
        Ok(self.make_process(geometry))
    }
}

/// Sink that records every event and can simulate its window closing.
#[derive(Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SessionEvent>>>,
    open: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn boxed(&self) -> Box<dyn OutputSink> {
        Box::new(self.clone())
    }

    pub fn close_window(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn outputs(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Output(data) => Some(data),
                SessionEvent::Closed => None,
            })
            .collect()
    }

    pub fn saw_closed(&self) -> bool {
        self.events().contains(&SessionEvent::Closed)
    }
}

impl OutputSink for RecordingSink {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, event: SessionEvent) -> Result<(), String> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
