//! Covariance-adaptation updater
//!
//! Full reward-weighted averaging of mean and covariance (the PI²-CMA / CEM
//! family). The sample covariance is taken around the **old** mean, i.e. it
//! measures the weighted spread of the successful exploration steps rather
//! than the spread of the samples around their new centroid.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::traits::{clamp_eigenvalues, weighted_covariance, weighted_mean, Updater};
use super::weighting::WeightingMethod;
use crate::distribution::DistributionGaussian;
use crate::error::{BboError, BboResult};

/// Default eigenvalue floor for adapted covariances
pub const DEFAULT_MIN_LEVEL: f64 = 1e-6;

/// Updates mean and full covariance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdaterCovarAdaptation {
    /// Cost-to-weight transform
    #[serde(default)]
    pub weighting: WeightingMethod,
    /// Blend factor between the old (0) and the sample covariance (1)
    pub learning_rate: f64,
    /// Lower bound on covariance eigenvalues
    pub min_level: f64,
    /// Optional upper bound on covariance eigenvalues
    #[serde(default)]
    pub max_level: Option<f64>,
    /// Keep only the diagonal of the adapted covariance
    #[serde(default)]
    pub diagonal_only: bool,
}

impl Default for UpdaterCovarAdaptation {
    fn default() -> Self {
        Self {
            weighting: WeightingMethod::default(),
            learning_rate: 1.0,
            min_level: DEFAULT_MIN_LEVEL,
            max_level: None,
            diagonal_only: false,
        }
    }
}

impl UpdaterCovarAdaptation {
    /// Create a covariance-adaptation updater with default bounds
    pub fn new(weighting: WeightingMethod) -> Self {
        Self {
            weighting,
            ..Default::default()
        }
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the eigenvalue bounds
    pub fn levels(mut self, min_level: f64, max_level: Option<f64>) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    /// Only adapt variances, not correlations
    pub fn diagonal_only(mut self, diagonal_only: bool) -> Self {
        self.diagonal_only = diagonal_only;
        self
    }
}

impl Updater for UpdaterCovarAdaptation {
    fn name(&self) -> &'static str {
        "covar_adaptation"
    }

    fn weighting(&self) -> &WeightingMethod {
        &self.weighting
    }

    fn validate(&self) -> BboResult<()> {
        self.weighting.validate()?;
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(BboError::Precondition(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !self.min_level.is_finite() || self.min_level <= 0.0 {
            return Err(BboError::Precondition(format!(
                "min_level must be finite and positive, got {}",
                self.min_level
            )));
        }
        if let Some(max_level) = self.max_level {
            if !(max_level >= self.min_level) {
                return Err(BboError::Precondition(format!(
                    "max_level ({}) must be >= min_level ({})",
                    max_level, self.min_level
                )));
            }
        }
        Ok(())
    }

    fn update_with_weights(
        &self,
        distribution: &DistributionGaussian,
        samples: &DMatrix<f64>,
        weights: &DVector<f64>,
    ) -> BboResult<DistributionGaussian> {
        let mean = weighted_mean(samples, weights);

        let sample_covariance = weighted_covariance(samples, weights, distribution.mean());
        let mut covariance = distribution.covariance() * (1.0 - self.learning_rate)
            + sample_covariance * self.learning_rate;

        if self.diagonal_only {
            covariance = DMatrix::from_diagonal(&covariance.diagonal());
        }

        let covariance = clamp_eigenvalues(covariance, self.min_level, self.max_level)?;
        DistributionGaussian::new(mean, covariance)
    }
}
