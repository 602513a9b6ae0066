//! Mean-only updater
//!
//! Reward-weighted averaging of the mean with fixed exploration: the
//! covariance is carried over unchanged.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::traits::{weighted_mean, Updater};
use super::weighting::WeightingMethod;
use crate::distribution::DistributionGaussian;
use crate::error::BboResult;

/// Updates the mean only; covariance stays fixed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdaterMean {
    /// Cost-to-weight transform
    #[serde(default)]
    pub weighting: WeightingMethod,
}

impl UpdaterMean {
    /// Create a mean-only updater with the given weighting
    pub fn new(weighting: WeightingMethod) -> Self {
        Self { weighting }
    }

    /// Mean-only updater with exponential (PI-BB) weighting
    pub fn with_eliteness(eliteness: f64) -> Self {
        Self::new(WeightingMethod::PiBb { eliteness })
    }
}

impl Updater for UpdaterMean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn weighting(&self) -> &WeightingMethod {
        &self.weighting
    }

    fn update_with_weights(
        &self,
        distribution: &DistributionGaussian,
        samples: &DMatrix<f64>,
        weights: &DVector<f64>,
    ) -> BboResult<DistributionGaussian> {
        DistributionGaussian::new(
            weighted_mean(samples, weights),
            distribution.covariance().clone(),
        )
    }
}
