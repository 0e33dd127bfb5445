//! Per-session output forwarding on a dedicated I/O thread.
//!
//! PTY reads are blocking, so each session gets its own OS thread that owns
//! the PTY reader and pushes chunks to the session's [`OutputSink`]. The sink
//! sits behind a mutex that the thread holds while delivering; [`detach`]
//! takes the sink out under that same lock, so once `detach` returns nothing
//! more reaches the channel.
//!
//! [`detach`]: OutputSubscription::detach

use std::io::{ErrorKind, Read};
use std::sync::{Arc, Mutex, PoisonError};

use crate::channel::{ChannelId, OutputSink, SessionEvent};
use crate::pty::PtyError;

const READ_BUFFER_SIZE: usize = 65536;

type SharedSink = Arc<Mutex<Option<Box<dyn OutputSink>>>>;

/// Revocable link from a session's PTY output to its channel.
pub struct OutputSubscription {
    channel_id: ChannelId,
    sink: SharedSink,
}

impl OutputSubscription {
    /// Start forwarding everything read from `reader` to `sink`.
    pub fn attach(
        channel_id: ChannelId,
        reader: Box<dyn Read + Send>,
        sink: Box<dyn OutputSink>,
    ) -> Result<Self, PtyError> {
        let sink: SharedSink = Arc::new(Mutex::new(Some(sink)));
        let thread_sink = Arc::clone(&sink);
        let thread_channel = channel_id.clone();

        std::thread::Builder::new()
            .name(format!("pty-io-{channel_id}"))
            .spawn(move || forward_loop(&thread_channel, reader, &thread_sink))?;

        Ok(Self { channel_id, sink })
    }

    /// Stop delivering to the channel. Idempotent.
    pub fn detach(&self) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if sink.take().is_some() {
            log::debug!("detached output of {}", self.channel_id);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for OutputSubscription {
    fn drop(&mut self) {
        self.detach();
    }
}

fn forward_loop(channel_id: &str, mut reader: Box<dyn Read + Send>, sink: &SharedSink) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => {
                deliver(channel_id, sink, SessionEvent::Closed);
                return;
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                // EIO here is how Linux reports the shell hanging up.
                log::debug!("PTY read for {channel_id} ended: {e}");
                deliver(channel_id, sink, SessionEvent::Closed);
                return;
            }
        };

        if !deliver(channel_id, sink, SessionEvent::Output(buf[..n].to_vec())) {
            return;
        }
    }
}

/// Returns `false` once the subscription has been detached.
fn deliver(channel_id: &str, sink: &SharedSink, event: SessionEvent) -> bool {
    let guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(sink) = guard.as_ref() else {
        return false;
    };

    // Window already gone: keep draining so the shell never blocks on a full PTY.
    if !sink.is_open() {
        return true;
    }

    if let Err(e) = sink.send(event) {
        log::warn!("dropping output for {channel_id}: {e}");
    }
    true
}
