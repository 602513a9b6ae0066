//! Checkpointing of optimization runs
//!
//! This module persists every update of a run into a directory-based log
//! (per-update artifacts, a learning curve and a run manifest) and reads it
//! back for inspection.

pub mod config;
pub mod format;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use config::*;
pub use format::FORMAT_VERSION;
pub use manifest::*;
pub use reader::*;
pub use writer::*;

/// Prelude for checkpoint module
pub mod prelude {
    pub use super::config::*;
    pub use super::manifest::*;
    pub use super::reader::*;
    pub use super::writer::*;
}
