//! Optimization loop
//!
//! This module provides the optimizer that drives sampling, cost evaluation
//! and distribution updates, and the per-update record it produces.

pub mod config;
pub mod optimizer;
pub mod record;

pub use config::*;
pub use optimizer::*;
pub use record::*;

pub mod prelude {
    pub use super::config::*;
    pub use super::optimizer::*;
    pub use super::record::*;
}
