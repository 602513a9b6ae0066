//! Gaussian search distributions
//!
//! This module provides the multivariate Gaussian that represents the current
//! search focus, and the block-structured variant used when sub-blocks of the
//! parameter vector are optimized independently.

pub mod gaussian;
pub mod search;

pub use gaussian::*;
pub use search::*;

pub mod prelude {
    pub use super::gaussian::*;
    pub use super::search::*;
}
