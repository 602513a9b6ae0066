//! Cost evaluation
//!
//! This module provides the batched cost function abstraction, an adapter for
//! per-sample cost functions, and the quadratic reference cost.

pub mod quadratic;
pub mod traits;

pub use quadratic::*;
pub use traits::*;

pub mod prelude {
    pub use super::quadratic::*;
    pub use super::traits::*;
}
