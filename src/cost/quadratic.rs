//! Quadratic reference cost
//!
//! cost(x) = ‖x − target‖², the standard smoke-test problem for the
//! optimization loop. Unimodal, convex, separable; optimum 0 at `target`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::traits::CostFunction;
use crate::error::{ensure_dimension, BboResult};

/// Squared Euclidean distance to a target point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostFunctionQuadratic {
    target: DVector<f64>,
}

impl CostFunctionQuadratic {
    /// Create a quadratic cost centered on `target`
    pub fn new(target: DVector<f64>) -> Self {
        Self { target }
    }

    /// Quadratic cost centered on the origin
    pub fn origin(dimension: usize) -> Self {
        Self::new(DVector::zeros(dimension))
    }

    /// The optimum of this cost function
    pub fn target(&self) -> &DVector<f64> {
        &self.target
    }
}

impl CostFunction for CostFunctionQuadratic {
    fn evaluate(&self, samples: &DMatrix<f64>) -> BboResult<DVector<f64>> {
        ensure_dimension(self.target.len(), samples.nrows())?;
        Ok(DVector::from_iterator(
            samples.ncols(),
            samples
                .column_iter()
                .map(|column| (column - &self.target).norm_squared()),
        ))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.target.len())
    }
}
