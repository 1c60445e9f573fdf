//! Capture side of the archiver: the game server process, the harvested-data
//! hand-off, frame sources, the capture session and everything it writes.

pub mod archive;
pub mod artifacts;
pub mod cli;
pub mod config;
mod error;
pub mod handoff;
pub mod pipeline;
pub mod server;
pub mod session;
pub mod transport;

pub use config::ArchiverConfig;
pub use error::{ArchiverError, Result};
pub use session::{CaptureOutput, CaptureSession, EndReason};
pub use transport::{ChannelSource, FrameSource, RelaySource, ReplaySource};
