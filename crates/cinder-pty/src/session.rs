use crate::channel::{ChannelId, OutputSink};
use crate::pty::{PtyError, PtyProcess};
use crate::subscription::OutputSubscription;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cols: u16,
    pub rows: u16,
}

impl Geometry {
    /// Returns `None` if either dimension is zero.
    pub fn new(cols: u16, rows: u16) -> Option<Self> {
        (cols > 0 && rows > 0).then_some(Self { cols, rows })
    }

    /// Like [`Geometry::new`], falling back to 80x24 for a zero dimension.
    pub fn or_default(cols: u16, rows: u16) -> Self {
        Self::new(cols, rows).unwrap_or_default()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

/// One shell process bound to one channel.
///
/// The session exclusively owns its process. Disposal always detaches the
/// output subscription before killing the process, and a session that is
/// dropped without being disposed disposes itself.
pub struct Session {
    channel_id: ChannelId,
    process: Box<dyn PtyProcess>,
    geometry: Geometry,
    subscription: OutputSubscription,
    disposed: bool,
}

impl Session {
    /// Bind a freshly spawned process to `channel_id` and start forwarding
    /// its output to `sink`.
    ///
    /// If forwarding cannot be started the process is killed before the
    /// error is returned.
    pub fn start(
        channel_id: ChannelId,
        mut process: Box<dyn PtyProcess>,
        geometry: Geometry,
        sink: Box<dyn OutputSink>,
    ) -> Result<Self, PtyError> {
        let attached = process
            .take_reader()
            .ok_or_else(|| PtyError::SpawnFailed("PTY reader already taken".to_string()))
            .and_then(|reader| OutputSubscription::attach(channel_id.clone(), reader, sink));

        let subscription = match attached {
            Ok(subscription) => subscription,
            Err(e) => {
                if let Err(kill_err) = process.kill() {
                    log::warn!("failed to kill shell for {channel_id} after setup error: {kill_err}");
                }
                return Err(e);
            }
        };

        Ok(Self {
            channel_id,
            process,
            geometry,
            subscription,
            disposed: false,
        })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Last geometry successfully applied to the PTY.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn process_id(&self) -> Option<u32> {
        self.process.process_id()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_attached()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Forward input bytes verbatim to the shell.
    pub fn write_input(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.process.write(data)
    }

    /// Resize the PTY. The recorded geometry only changes on success.
    pub fn resize(&mut self, geometry: Geometry) -> Result<(), PtyError> {
        self.process.resize(geometry)?;
        self.geometry = geometry;
        Ok(())
    }

    /// Detach output, then kill the process. Safe to call more than once;
    /// only the first call touches the process.
    pub fn dispose(&mut self) -> Result<(), PtyError> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.subscription.detach();
        self.process.kill()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            log::warn!("failed to kill shell for {}: {e}", self.channel_id);
        }
    }
}
