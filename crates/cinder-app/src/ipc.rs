//! IPC types for communication between the Tauri backend and frontend.
//!
//! Session output reaches the frontend as `TerminalEvent`s, serialized as
//! tagged JSON over the `tauri::ipc::Channel` the window passed to
//! `create_session`. Output travels as text: each window decodes its PTY
//! bytes as a UTF-8 stream, so a character split across two reads is held
//! back until it is complete.

use std::sync::{Mutex, PoisonError};

use cinder_pty::{OutputSink, SessionEvent};
use serde::Serialize;
use tauri::ipc::Channel;
use tauri::{AppHandle, Manager};

/// Events sent from the backend to one window's terminal.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TerminalEvent {
    /// One chunk of shell output.
    Output { data: String },
    /// The shell process exited.
    Closed,
}

/// Geometry and pid of a freshly created session, returned to the frontend.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub cols: u16,
    pub rows: u16,
    pub pid: Option<u32>,
}

/// Incremental UTF-8 decoder for PTY output.
///
/// Invalid bytes become U+FFFD; an incomplete sequence at the end of a chunk
/// is kept for the next one.
#[derive(Debug, Default)]
pub struct Utf8Stream {
    pending: Vec<u8>,
}

impl Utf8Stream {
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut text = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let tail = rest.to_vec();
        self.pending = tail;
        text
    }

    /// Whatever is still held back, lossily decoded. Used when the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }
}

/// Delivers one session's output to the window that created it.
pub struct WindowSink {
    app: AppHandle,
    label: String,
    channel: Channel<TerminalEvent>,
    decoder: Mutex<Utf8Stream>,
}

impl WindowSink {
    pub fn new(app: AppHandle, label: String, channel: Channel<TerminalEvent>) -> Self {
        Self {
            app,
            label,
            channel,
            decoder: Mutex::new(Utf8Stream::default()),
        }
    }

    fn push(&self, event: TerminalEvent) -> Result<(), String> {
        self.channel
            .send(event)
            .map_err(|e| format!("send to {} failed: {e}", self.label))
    }
}

impl OutputSink for WindowSink {
    fn is_open(&self) -> bool {
        self.app.get_webview_window(&self.label).is_some()
    }

    fn send(&self, event: SessionEvent) -> Result<(), String> {
        let mut decoder = self.decoder.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            SessionEvent::Output(bytes) => {
                let data = decoder.decode(&bytes);
                if data.is_empty() {
                    return Ok(());
                }
                self.push(TerminalEvent::Output { data })
            }
            SessionEvent::Closed => {
                if let Some(data) = decoder.finish() {
                    self.push(TerminalEvent::Output { data })?;
                }
                self.push(TerminalEvent::Closed)
            }
        }
    }
}
