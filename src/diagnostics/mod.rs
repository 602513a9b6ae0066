//! Diagnostics and statistics
//!
//! This module provides the learning curve of an optimization run: the cost
//! of the distribution mean and the exploration magnitude at every update.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// One row of the learning curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningCurveEntry {
    /// Update index (1-based)
    pub update: usize,
    /// Samples evaluated up to and including this update
    pub n_samples: usize,
    /// Cost of the distribution mean before the update
    pub cost_eval: f64,
    /// Square root of the largest covariance eigenvalue before the update
    pub exploration: f64,
}

/// Number of columns in the matrix form of a learning curve
pub const LEARNING_CURVE_COLUMNS: usize = 4;

/// Learning curve of an optimization run, ordered by update index
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    entries: Vec<LearningCurveEntry>,
}

impl LearningCurve {
    /// Create an empty learning curve
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any existing entry for the same update
    pub fn record(&mut self, entry: LearningCurveEntry) {
        match self
            .entries
            .binary_search_by_key(&entry.update, |e| e.update)
        {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Whether an entry exists for `update`
    pub fn contains(&self, update: usize) -> bool {
        self.get(update).is_some()
    }

    /// Entry for `update`, if recorded
    pub fn get(&self, update: usize) -> Option<&LearningCurveEntry> {
        self.entries
            .binary_search_by_key(&update, |e| e.update)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// All entries in update order
    pub fn entries(&self) -> &[LearningCurveEntry] {
        &self.entries
    }

    /// Number of recorded updates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no update has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// History of mean costs
    pub fn costs(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.cost_eval).collect()
    }

    /// History of exploration magnitudes
    pub fn exploration(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.exploration).collect()
    }

    /// Lowest mean cost seen
    pub fn best_cost(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|e| e.cost_eval)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Mean cost at the last recorded update
    pub fn final_cost(&self) -> Option<f64> {
        self.entries.last().map(|e| e.cost_eval)
    }

    /// Matrix form: one row per update, columns
    /// `[update, n_samples, cost_eval, exploration]`
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.entries.len(), LEARNING_CURVE_COLUMNS, |i, j| {
            let e = &self.entries[i];
            match j {
                0 => e.update as f64,
                1 => e.n_samples as f64,
                2 => e.cost_eval,
                _ => e.exploration,
            }
        })
    }

    /// Rebuild a learning curve from its matrix form
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Option<Self> {
        if matrix.nrows() > 0 && matrix.ncols() != LEARNING_CURVE_COLUMNS {
            return None;
        }
        let mut curve = Self::new();
        for row in matrix.row_iter() {
            if row[0] < 0.0 || row[1] < 0.0 || row[0].fract() != 0.0 || row[1].fract() != 0.0 {
                return None;
            }
            curve.record(LearningCurveEntry {
                update: row[0] as usize,
                n_samples: row[1] as usize,
                cost_eval: row[2],
                exploration: row[3],
            });
        }
        Some(curve)
    }

    /// Get a summary of the run
    pub fn summary(&self) -> String {
        let first = self.entries.first().map(|e| e.cost_eval).unwrap_or(f64::NAN);
        format!(
            "Optimization Summary:\n\
             - Updates: {}\n\
             - Samples: {}\n\
             - Initial cost: {:.6}\n\
             - Final cost: {:.6}\n\
             - Best cost: {:.6}",
            self.len(),
            self.entries.last().map(|e| e.n_samples).unwrap_or(0),
            first,
            self.final_cost().unwrap_or(f64::NAN),
            self.best_cost().unwrap_or(f64::NAN),
        )
    }
}

pub mod prelude {
    pub use super::{LearningCurve, LearningCurveEntry};
}
