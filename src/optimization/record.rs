//! Per-update record
//!
//! Everything that happened in one iteration of the optimization loop, as
//! handed to the checkpoint writer and as read back from disk.

use nalgebra::{DMatrix, DVector};

use crate::diagnostics::LearningCurveEntry;
use crate::distribution::SearchDistribution;

/// The full state of one update
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRecord {
    /// Update index (1-based)
    pub update: usize,
    /// Distribution before the update
    pub distribution: SearchDistribution,
    /// Cost of the distribution mean, without exploration
    pub cost_eval: f64,
    /// Samples drawn from `distribution`, one per column
    pub samples: DMatrix<f64>,
    /// Cost of each sample
    pub costs: DVector<f64>,
    /// Normalized weight of each sample
    pub weights: DVector<f64>,
    /// Distribution after the update
    pub distribution_new: SearchDistribution,
}

impl UpdateRecord {
    /// Number of samples evaluated in this update
    pub fn n_samples(&self) -> usize {
        self.samples.ncols()
    }

    /// Learning-curve row for this update
    pub fn learning_curve_entry(&self, n_samples_so_far: usize) -> LearningCurveEntry {
        LearningCurveEntry {
            update: self.update,
            n_samples: n_samples_so_far,
            cost_eval: self.cost_eval,
            exploration: self.distribution.exploration(),
        }
    }
}
