//! Multivariate Gaussian distribution
//!
//! `DistributionGaussian` is an immutable value: updaters construct a new
//! instance each iteration instead of mutating the old one.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_dimension, BboError, BboResult};

/// Relative tolerance used for symmetry and PSD checks
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Multivariate normal distribution N(mean, covariance)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GaussianData")]
pub struct DistributionGaussian {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
}

/// Unchecked serialized form, validated through [`DistributionGaussian::new`]
#[derive(Deserialize)]
struct GaussianData {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
}

impl TryFrom<GaussianData> for DistributionGaussian {
    type Error = BboError;

    fn try_from(data: GaussianData) -> BboResult<Self> {
        Self::new(data.mean, data.covariance)
    }
}

impl DistributionGaussian {
    /// Create a distribution, validating shape, finiteness and symmetry
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> BboResult<Self> {
        let n = mean.len();
        if n == 0 {
            return Err(BboError::Precondition(
                "distribution must have at least one dimension".to_string(),
            ));
        }
        if !covariance.is_square() {
            return Err(BboError::Precondition(format!(
                "covariance must be square, got {}x{}",
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        ensure_dimension(n, covariance.nrows())?;

        if mean.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(BboError::Numerical(
                "distribution contains non-finite values".to_string(),
            ));
        }

        let scale = covariance.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
        for i in 0..n {
            for j in 0..i {
                if (covariance[(i, j)] - covariance[(j, i)]).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(BboError::Precondition(format!(
                        "covariance is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }

        Ok(Self { mean, covariance })
    }

    /// Create a distribution with covariance `sigma² · I`
    pub fn isotropic(mean: DVector<f64>, sigma: f64) -> BboResult<Self> {
        let n = mean.len();
        Self::new(mean, DMatrix::identity(n, n) * (sigma * sigma))
    }

    /// Create a distribution with a diagonal covariance
    pub fn diagonal(mean: DVector<f64>, variances: DVector<f64>) -> BboResult<Self> {
        if variances.iter().any(|&v| v < 0.0) {
            return Err(BboError::Precondition(
                "variances must be non-negative".to_string(),
            ));
        }
        Self::new(mean, DMatrix::from_diagonal(&variances))
    }

    /// Mean of the distribution
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Covariance matrix of the distribution
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Dimensionality of the parameter space
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Largest eigenvalue of the covariance matrix
    pub fn max_eigenvalue(&self) -> f64 {
        self.covariance
            .clone()
            .symmetric_eigen()
            .eigenvalues
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Draw `n_samples` samples; column `k` of the result is sample `k`.
    ///
    /// The distribution itself is untouched, so a seeded RNG reproduces the
    /// same batch.
    pub fn generate_samples<R: Rng + ?Sized>(
        &self,
        n_samples: usize,
        rng: &mut R,
    ) -> BboResult<DMatrix<f64>> {
        if n_samples == 0 {
            return Err(BboError::Precondition(
                "number of samples must be at least 1".to_string(),
            ));
        }

        let factor = self.sampling_factor()?;
        let n = self.dimension();

        let z = DMatrix::from_fn(n, n_samples, |_, _| -> f64 { StandardNormal.sample(rng) });
        let mut samples = factor * z;
        for mut column in samples.column_iter_mut() {
            column += &self.mean;
        }

        Ok(samples)
    }

    /// Matrix `A` with `A Aᵀ = covariance`
    ///
    /// Cholesky is tried first; singular PSD matrices fall back to an
    /// eigendecomposition with eigenvalues clamped at zero.
    fn sampling_factor(&self) -> BboResult<DMatrix<f64>> {
        if let Some(cholesky) = self.covariance.clone().cholesky() {
            return Ok(cholesky.l());
        }

        let eigen = self.covariance.clone().symmetric_eigen();
        if eigen.eigenvalues.iter().any(|v| !v.is_finite()) {
            return Err(BboError::Numerical(
                "covariance eigendecomposition failed".to_string(),
            ));
        }

        let largest = eigen
            .eigenvalues
            .iter()
            .fold(0.0_f64, |m, v| m.max(v.abs()));
        let tolerance = SYMMETRY_TOLERANCE * largest.max(1.0);
        if let Some(negative) = eigen.eigenvalues.iter().find(|&&v| v < -tolerance) {
            return Err(BboError::Numerical(format!(
                "covariance is not positive semi-definite (eigenvalue {:e})",
                negative
            )));
        }

        let roots = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
        Ok(&eigen.eigenvectors * DMatrix::from_diagonal(&roots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dvec(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    #[test]
    fn test_new_rejects_mismatched_shapes() {
        let err = DistributionGaussian::new(dvec(&[0.0, 0.0]), DMatrix::identity(3, 3));
        assert!(matches!(
            err,
            Err(BboError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));

        let err = DistributionGaussian::new(dvec(&[0.0, 0.0]), DMatrix::zeros(2, 3));
        assert!(matches!(err, Err(BboError::Precondition(_))));
    }

    #[test]
    fn test_new_rejects_asymmetric_covariance() {
        let covar = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]);
        let err = DistributionGaussian::new(dvec(&[0.0, 0.0]), covar);
        assert!(matches!(err, Err(BboError::Precondition(_))));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let err = DistributionGaussian::new(dvec(&[f64::NAN]), DMatrix::identity(1, 1));
        assert!(matches!(err, Err(BboError::Numerical(_))));
    }

    #[test]
    fn test_sample_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = DistributionGaussian::isotropic(dvec(&[1.0, 2.0, 3.0]), 0.5).unwrap();

        let samples = dist.generate_samples(7, &mut rng).unwrap();

        assert_eq!(samples.nrows(), 3);
        assert_eq!(samples.ncols(), 7);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = DistributionGaussian::isotropic(dvec(&[0.0]), 1.0).unwrap();
        assert!(matches!(
            dist.generate_samples(0, &mut rng),
            Err(BboError::Precondition(_))
        ));
    }

    #[test]
    fn test_sampling_is_reproducible() {
        let dist = DistributionGaussian::new(
            dvec(&[1.0, -1.0]),
            DMatrix::from_row_slice(2, 2, &[2.0, 0.3, 0.3, 0.5]),
        )
        .unwrap();

        let a = dist
            .generate_samples(10, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let b = dist
            .generate_samples(10, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_statistics() {
        let mut rng = StdRng::seed_from_u64(1);
        let covar = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 2.0]);
        let dist = DistributionGaussian::new(dvec(&[3.0, -2.0]), covar.clone()).unwrap();

        let n = 20_000;
        let samples = dist.generate_samples(n, &mut rng).unwrap();
        let mean = samples.column_mean();
        assert_relative_eq!(mean[0], 3.0, epsilon = 0.1);
        assert_relative_eq!(mean[1], -2.0, epsilon = 0.1);

        let mut centered = samples.clone();
        for mut column in centered.column_iter_mut() {
            column -= &mean;
        }
        let empirical = &centered * centered.transpose() / (n as f64 - 1.0);
        for (e, c) in empirical.iter().zip(covar.iter()) {
            assert_relative_eq!(*e, *c, epsilon = 0.15);
        }
    }

    #[test]
    fn test_zero_covariance_returns_mean() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = DistributionGaussian::new(dvec(&[1.5, 2.5]), DMatrix::zeros(2, 2)).unwrap();

        let samples = dist.generate_samples(5, &mut rng).unwrap();
        for column in samples.column_iter() {
            assert_relative_eq!(column[0], 1.5);
            assert_relative_eq!(column[1], 2.5);
        }
    }

    #[test]
    fn test_singular_covariance_samples_on_subspace() {
        let mut rng = StdRng::seed_from_u64(5);
        // Rank-one covariance: all mass on the x = y line
        let covar = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let dist = DistributionGaussian::new(dvec(&[0.0, 0.0]), covar).unwrap();

        let samples = dist.generate_samples(20, &mut rng).unwrap();
        for column in samples.column_iter() {
            assert_relative_eq!(column[0], column[1], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_indefinite_covariance_fails() {
        let mut rng = StdRng::seed_from_u64(5);
        let covar = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        let dist = DistributionGaussian::new(dvec(&[0.0, 0.0]), covar).unwrap();

        assert!(matches!(
            dist.generate_samples(3, &mut rng),
            Err(BboError::Numerical(_))
        ));
    }

    #[test]
    fn test_max_eigenvalue() {
        let dist = DistributionGaussian::diagonal(dvec(&[0.0, 0.0]), dvec(&[0.5, 3.0])).unwrap();
        assert_relative_eq!(dist.max_eigenvalue(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_serde_roundtrip() {
        let dist = DistributionGaussian::isotropic(dvec(&[1.0, 2.0]), 2.0).unwrap();
        let json = serde_json::to_string(&dist).unwrap();
        let loaded: DistributionGaussian = serde_json::from_str(&json).unwrap();
        assert_eq!(dist, loaded);
    }

    #[test]
    fn test_deserialize_validates() {
        let encode = |mean: DVector<f64>, covariance: DMatrix<f64>| {
            serde_json::json!({ "mean": mean, "covariance": covariance }).to_string()
        };

        let asymmetric = encode(
            dvec(&[0.0, 0.0]),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.5, -0.5, 1.0]),
        );
        let err = serde_json::from_str::<DistributionGaussian>(&asymmetric).unwrap_err();
        assert!(err.to_string().contains("not symmetric"), "{}", err);

        let mismatched = encode(dvec(&[0.0, 0.0]), DMatrix::identity(3, 3));
        assert!(serde_json::from_str::<DistributionGaussian>(&mismatched).is_err());

        let empty = encode(DVector::zeros(0), DMatrix::zeros(0, 0));
        assert!(serde_json::from_str::<DistributionGaussian>(&empty).is_err());

        let valid = encode(dvec(&[1.0, 2.0]), DMatrix::identity(2, 2));
        let loaded: DistributionGaussian = serde_json::from_str(&valid).unwrap();
        assert_eq!(loaded.covariance(), &DMatrix::identity(2, 2));
    }
}
