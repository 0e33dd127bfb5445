//! The core's view of a window's communication channel.

/// Identity of the channel a session is bound to. Stable for the life of a window.
pub type ChannelId = String;

/// Events delivered from a session to its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One chunk of shell output, exactly as read from the PTY.
    Output(Vec<u8>),
    /// The shell's output stream ended (the shell exited on its own).
    Closed,
}

/// Destination for one session's events.
///
/// Implementations are called from the session's I/O thread.
pub trait OutputSink: Send + 'static {
    /// Whether the owning window still exists. Events for a closed window are dropped.
    fn is_open(&self) -> bool;

    fn send(&self, event: SessionEvent) -> Result<(), String>;
}
