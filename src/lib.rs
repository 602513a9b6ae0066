//! # gauss-bbo
//!
//! Black-box optimization of parameter vectors with Gaussian search
//! distributions.
//!
//! Each update samples candidate parameter vectors from a multivariate
//! Gaussian, evaluates their costs in one batch, turns the costs into weights
//! and re-estimates the distribution by reward-weighted averaging. Every
//! update can be persisted to a directory-based log for later inspection.
//!
//! ## Core Concepts
//!
//! - **Search distribution**: a Gaussian (or a set of independent Gaussian
//!   blocks) over the parameter space, immutable between updates
//! - **Cost function**: a batched black box mapping a (D, K) sample matrix to
//!   K costs; lower is better
//! - **Updater**: an interchangeable policy (mean only, covariance decay,
//!   covariance adaptation) driven by a cost-to-weight transform
//! - **Checkpointing**: per-update artifacts plus a learning curve on disk
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gauss_bbo::prelude::*;
//! use nalgebra::DVector;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let initial = DistributionGaussian::isotropic(DVector::from_element(2, 5.0), 1.0)?;
//!
//! let result = Optimizer::builder()
//!     .distribution(initial)
//!     .cost(CostFunctionQuadratic::origin(2))
//!     .updater(UpdaterCovarAdaptation::default())
//!     .n_updates(50)
//!     .n_samples_per_update(20)
//!     .checkpoint(CheckpointConfig::new("runs/quadratic"))
//!     .build()?
//!     .run(&mut rng)?;
//!
//! println!("{}", result.learning_curve.summary());
//! ```

pub mod checkpoint;
pub mod cost;
pub mod diagnostics;
pub mod distribution;
pub mod error;
pub mod optimization;
pub mod updater;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::checkpoint::prelude::*;
    pub use crate::cost::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::distribution::prelude::*;
    pub use crate::error::*;
    pub use crate::optimization::prelude::*;
    pub use crate::updater::prelude::*;
}
