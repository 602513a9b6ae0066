//! Updater trait
//!
//! An updater is a pure function `(distribution, samples, costs) → new
//! distribution`. Implementations only supply the reweighting step; weight
//! computation, input validation and block handling are shared.

use nalgebra::{DMatrix, DVector};

use super::weighting::WeightingMethod;
use crate::distribution::{DistributionGaussian, SearchDistribution};
use crate::error::{ensure_dimension, BboError, BboResult};

/// Result of one distribution update
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateOutcome<D> {
    /// The re-estimated distribution
    pub distribution: D,
    /// Normalized weight of each sample
    pub weights: DVector<f64>,
}

/// Distribution update policy
pub trait Updater {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// The cost-to-weight transform used by this updater
    fn weighting(&self) -> &WeightingMethod;

    /// Re-estimate one Gaussian from samples and normalized weights.
    ///
    /// `samples` has one column per sample and `weights` sums to 1; both have
    /// already been validated against `distribution`.
    fn update_with_weights(
        &self,
        distribution: &DistributionGaussian,
        samples: &DMatrix<f64>,
        weights: &DVector<f64>,
    ) -> BboResult<DistributionGaussian>;

    /// Check the updater's parameters
    fn validate(&self) -> BboResult<()> {
        self.weighting().validate()
    }

    /// Update a single Gaussian from samples and their costs
    fn update_distribution(
        &self,
        distribution: &DistributionGaussian,
        samples: &DMatrix<f64>,
        costs: &DVector<f64>,
    ) -> BboResult<UpdateOutcome<DistributionGaussian>> {
        check_batch(distribution.dimension(), samples, costs)?;
        let weights = self.weighting().costs_to_weights(costs)?;
        let distribution = self.update_with_weights(distribution, samples, &weights)?;
        Ok(UpdateOutcome {
            distribution,
            weights,
        })
    }

    /// Update every block of a search distribution.
    ///
    /// Weights are computed once from the shared costs; each block is
    /// re-estimated from its own rows of the sample matrix.
    fn update_distributions(
        &self,
        distribution: &SearchDistribution,
        samples: &DMatrix<f64>,
        costs: &DVector<f64>,
    ) -> BboResult<UpdateOutcome<SearchDistribution>> {
        check_batch(distribution.dimension(), samples, costs)?;
        let weights = self.weighting().costs_to_weights(costs)?;

        let mut blocks = Vec::with_capacity(distribution.num_blocks());
        for (block, range) in distribution
            .as_blocks()
            .iter()
            .zip(distribution.block_ranges())
        {
            let block_samples = samples.rows(range.start, range.len()).into_owned();
            blocks.push(self.update_with_weights(block, &block_samples, &weights)?);
        }

        Ok(UpdateOutcome {
            distribution: distribution.with_blocks(blocks)?,
            weights,
        })
    }
}

impl<U: Updater + ?Sized> Updater for &U {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn weighting(&self) -> &WeightingMethod {
        (**self).weighting()
    }

    fn update_with_weights(
        &self,
        distribution: &DistributionGaussian,
        samples: &DMatrix<f64>,
        weights: &DVector<f64>,
    ) -> BboResult<DistributionGaussian> {
        (**self).update_with_weights(distribution, samples, weights)
    }

    fn validate(&self) -> BboResult<()> {
        (**self).validate()
    }
}

impl<U: Updater + ?Sized> Updater for Box<U> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn weighting(&self) -> &WeightingMethod {
        (**self).weighting()
    }

    fn update_with_weights(
        &self,
        distribution: &DistributionGaussian,
        samples: &DMatrix<f64>,
        weights: &DVector<f64>,
    ) -> BboResult<DistributionGaussian> {
        (**self).update_with_weights(distribution, samples, weights)
    }

    fn validate(&self) -> BboResult<()> {
        (**self).validate()
    }
}

/// Validate that samples and costs describe one batch of the given dimension
pub fn check_batch(
    dimension: usize,
    samples: &DMatrix<f64>,
    costs: &DVector<f64>,
) -> BboResult<()> {
    ensure_dimension(dimension, samples.nrows())?;
    ensure_dimension(samples.ncols(), costs.len())?;
    if samples.ncols() == 0 {
        return Err(BboError::Precondition(
            "cannot update from an empty sample batch".to_string(),
        ));
    }
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(BboError::Numerical(
            "samples contain non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Weighted mean of the sample columns
pub fn weighted_mean(samples: &DMatrix<f64>, weights: &DVector<f64>) -> DVector<f64> {
    samples * weights
}

/// Weighted outer-product sum `Σ w_k (x_k − c)(x_k − c)ᵀ` around `center`.
///
/// Computed as `E diag(w) Eᵀ` and symmetrized, so the result is symmetric by
/// construction.
pub fn weighted_covariance(
    samples: &DMatrix<f64>,
    weights: &DVector<f64>,
    center: &DVector<f64>,
) -> DMatrix<f64> {
    let mut centered = samples.clone();
    for mut column in centered.column_iter_mut() {
        column -= center;
    }

    let mut scaled = centered.clone();
    for (k, mut column) in scaled.column_iter_mut().enumerate() {
        column *= weights[k];
    }

    symmetrize(&scaled * centered.transpose())
}

/// Average a matrix with its transpose
pub fn symmetrize(matrix: DMatrix<f64>) -> DMatrix<f64> {
    (&matrix + matrix.transpose()) * 0.5
}

/// Clamp the eigenvalues of a symmetric matrix into `[min_level, max_level]`
pub fn clamp_eigenvalues(
    covariance: DMatrix<f64>,
    min_level: f64,
    max_level: Option<f64>,
) -> BboResult<DMatrix<f64>> {
    let max_level = max_level.unwrap_or(f64::INFINITY);
    let eigen = symmetrize(covariance).symmetric_eigen();
    if eigen.eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(BboError::Numerical(
            "covariance eigendecomposition failed".to_string(),
        ));
    }

    let clamped = eigen.eigenvalues.map(|v| v.clamp(min_level, max_level));
    let recomposed =
        &eigen.eigenvectors * DMatrix::from_diagonal(&clamped) * eigen.eigenvectors.transpose();
    Ok(symmetrize(recomposed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_check_batch() {
        let samples = DMatrix::zeros(2, 3);
        assert!(check_batch(2, &samples, &DVector::zeros(3)).is_ok());
        assert!(matches!(
            check_batch(3, &samples, &DVector::zeros(3)),
            Err(BboError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            check_batch(2, &samples, &DVector::zeros(4)),
            Err(BboError::DimensionMismatch { .. })
        ));

        let mut bad = samples.clone();
        bad[(1, 1)] = f64::NAN;
        assert!(matches!(
            check_batch(2, &bad, &DVector::zeros(3)),
            Err(BboError::Numerical(_))
        ));
    }

    #[test]
    fn test_weighted_mean() {
        let samples = DMatrix::from_column_slice(2, 2, &[0.0, 0.0, 4.0, 2.0]);
        let weights = DVector::from_column_slice(&[0.75, 0.25]);
        let mean = weighted_mean(&samples, &weights);
        assert_relative_eq!(mean[0], 1.0);
        assert_relative_eq!(mean[1], 0.5);
    }

    #[test]
    fn test_weighted_covariance_matches_outer_products() {
        let samples = DMatrix::from_column_slice(2, 3, &[1.0, 2.0, -1.0, 0.0, 3.0, -2.0]);
        let weights = DVector::from_column_slice(&[0.5, 0.3, 0.2]);
        let center = DVector::from_column_slice(&[0.5, 0.5]);

        let covar = weighted_covariance(&samples, &weights, &center);

        let mut expected = DMatrix::zeros(2, 2);
        for k in 0..3 {
            let e = samples.column(k) - &center;
            expected += &e * e.transpose() * weights[k];
        }
        for (a, b) in covar.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
        assert_eq!(covar, covar.transpose());
    }

    #[test]
    fn test_clamp_eigenvalues() {
        let covar = DMatrix::from_diagonal(&DVector::from_column_slice(&[1e-9, 4.0, 100.0]));
        let clamped = clamp_eigenvalues(covar, 0.01, Some(10.0)).unwrap();

        assert_relative_eq!(clamped[(0, 0)], 0.01, epsilon = 1e-12);
        assert_relative_eq!(clamped[(1, 1)], 4.0, epsilon = 1e-12);
        assert_relative_eq!(clamped[(2, 2)], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clamp_lifts_singular_matrix() {
        let rank_one = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let clamped = clamp_eigenvalues(rank_one, 0.1, None).unwrap();
        assert!(clamped.clone().cholesky().is_some());
        assert_eq!(clamped, clamped.transpose());
    }
}
