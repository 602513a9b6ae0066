//! Covariance-decay updater
//!
//! Mean by reward-weighted averaging; exploration shrinks geometrically by
//! multiplying the covariance with `decay²` every update.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::covar_adaptation::DEFAULT_MIN_LEVEL;
use super::traits::{clamp_eigenvalues, weighted_mean, Updater};
use super::weighting::WeightingMethod;
use crate::distribution::DistributionGaussian;
use crate::error::{BboError, BboResult};

/// Updates the mean and decays the covariance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdaterCovarDecay {
    /// Cost-to-weight transform
    #[serde(default)]
    pub weighting: WeightingMethod,
    /// Per-update factor on the standard deviation, in (0, 1]
    pub decay: f64,
    /// Lower bound on covariance eigenvalues; `0` lets exploration vanish
    #[serde(default = "default_min_level")]
    pub min_level: f64,
}

fn default_min_level() -> f64 {
    DEFAULT_MIN_LEVEL
}

impl Default for UpdaterCovarDecay {
    fn default() -> Self {
        Self {
            weighting: WeightingMethod::default(),
            decay: 0.95,
            min_level: DEFAULT_MIN_LEVEL,
        }
    }
}

impl UpdaterCovarDecay {
    /// Create a covariance-decay updater
    pub fn new(weighting: WeightingMethod, decay: f64) -> Self {
        Self {
            weighting,
            decay,
            ..Default::default()
        }
    }

    /// Set the eigenvalue floor
    pub fn with_min_level(mut self, min_level: f64) -> Self {
        self.min_level = min_level;
        self
    }
}

impl Updater for UpdaterCovarDecay {
    fn name(&self) -> &'static str {
        "covar_decay"
    }

    fn weighting(&self) -> &WeightingMethod {
        &self.weighting
    }

    fn validate(&self) -> BboResult<()> {
        self.weighting.validate()?;
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(BboError::Precondition(format!(
                "decay must be in (0, 1], got {}",
                self.decay
            )));
        }
        if !self.min_level.is_finite() || self.min_level < 0.0 {
            return Err(BboError::Precondition(format!(
                "min_level must be finite and non-negative, got {}",
                self.min_level
            )));
        }
        Ok(())
    }

    fn update_with_weights(
        &self,
        distribution: &DistributionGaussian,
        samples: &DMatrix<f64>,
        weights: &DVector<f64>,
    ) -> BboResult<DistributionGaussian> {
        let decayed = distribution.covariance() * (self.decay * self.decay);
        let covariance = if self.min_level > 0.0 {
            clamp_eigenvalues(decayed, self.min_level, None)?
        } else {
            decayed
        };
        DistributionGaussian::new(weighted_mean(samples, weights), covariance)
    }
}
