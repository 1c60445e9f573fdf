//! Bedrock packet definitions and the capture-session dispatcher.
//!
//! Only clientbound packets seen while joining a world have schemas. Ids
//! without one are still named and reported.

// Re-export protocol types
pub use bds_protocol::{Decode, Packet};

pub mod commands;
pub mod common;
pub mod dispatch;
pub mod ids;
pub mod play;
pub mod recipe;
pub mod registry;

pub use dispatch::{Dispatcher, Outcome, Report, ReportEntry};
pub use registry::{DecodeContext, FieldSet, SchemaRegistry};
