//! cinder-pty: per-window shell sessions for the Cinder editor.
//!
//! Each editor window owns at most one shell running on a pseudo-terminal.
//! This crate spawns those shells, streams their output back to the window
//! that asked for them, and tears them down when the window closes or the
//! application quits. It knows nothing about the GUI toolkit; the host
//! supplies an [`OutputSink`] per window.
//!
//! # Architecture
//!
//! - [`PtyHandle`]: Low-level PTY process management (spawn, write, resize, kill).
//! - [`Session`]: One shell bound to one channel, with its [`OutputSubscription`].
//! - [`SessionRegistry`]: The `channel -> session` map.
//! - [`SessionController`]: Create/write/resize/destroy requests from windows.
//! - [`WindowLifecycleCoordinator`]: Window close and app quit teardown.
//! - [`LaunchPlan`] / [`TerminalConfig`]: Which shell to start and with what environment.

pub mod channel;
pub mod config;
pub mod controller;
pub mod env;
pub mod lifecycle;
pub mod pty;
pub mod registry;
pub mod session;
pub mod subscription;

#[cfg(test)]
mod testing;

pub use channel::{ChannelId, OutputSink, SessionEvent};
pub use config::{ConfigError, TerminalConfig};
pub use controller::SessionController;
pub use env::{EnvOverlay, HostEnv, LaunchPlan, Platform};
pub use lifecycle::WindowLifecycleCoordinator;
pub use pty::{NativePtySpawner, PtyError, PtyHandle, PtyProcess, PtySpawner};
pub use registry::SessionRegistry;
pub use session::{Geometry, Session};
pub use subscription::OutputSubscription;
