//! Search distribution over the full parameter vector
//!
//! A run optimizes either one Gaussian over the whole parameter vector or one
//! independent Gaussian per sub-block. Block `b` owns a contiguous range of
//! rows in every sample matrix.

use std::ops::Range;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::gaussian::DistributionGaussian;
use crate::error::{ensure_dimension, BboError, BboResult};

/// Single or block-structured search distribution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SearchDistributionData")]
pub enum SearchDistribution {
    /// One Gaussian over the whole parameter vector
    Single(DistributionGaussian),
    /// One independent Gaussian per sub-block, in parameter order
    Blocks(Vec<DistributionGaussian>),
}

#[derive(Deserialize)]
enum SearchDistributionData {
    Single(DistributionGaussian),
    Blocks(Vec<DistributionGaussian>),
}

impl TryFrom<SearchDistributionData> for SearchDistribution {
    type Error = BboError;

    fn try_from(data: SearchDistributionData) -> BboResult<Self> {
        match data {
            SearchDistributionData::Single(d) => Ok(Self::Single(d)),
            SearchDistributionData::Blocks(blocks) => Self::blocks(blocks),
        }
    }
}

impl SearchDistribution {
    /// Create a block-structured distribution
    pub fn blocks(blocks: Vec<DistributionGaussian>) -> BboResult<Self> {
        if blocks.is_empty() {
            return Err(BboError::Precondition(
                "block distribution needs at least one block".to_string(),
            ));
        }
        Ok(Self::Blocks(blocks))
    }

    /// View the distribution as a slice of blocks (one for `Single`)
    pub fn as_blocks(&self) -> &[DistributionGaussian] {
        match self {
            Self::Single(d) => std::slice::from_ref(d),
            Self::Blocks(blocks) => blocks,
        }
    }

    /// Number of blocks
    pub fn num_blocks(&self) -> usize {
        self.as_blocks().len()
    }

    /// Whether this is a block-structured distribution
    pub fn is_blocks(&self) -> bool {
        matches!(self, Self::Blocks(_))
    }

    /// Total dimensionality of the parameter vector
    pub fn dimension(&self) -> usize {
        self.as_blocks().iter().map(|b| b.dimension()).sum()
    }

    /// Dimension of each block
    pub fn block_dimensions(&self) -> Vec<usize> {
        self.as_blocks().iter().map(|b| b.dimension()).collect()
    }

    /// Row range of each block within a sample matrix
    pub fn block_ranges(&self) -> Vec<Range<usize>> {
        let mut offset = 0;
        self.as_blocks()
            .iter()
            .map(|b| {
                let range = offset..offset + b.dimension();
                offset = range.end;
                range
            })
            .collect()
    }

    /// Concatenated mean of all blocks
    pub fn mean(&self) -> DVector<f64> {
        match self {
            Self::Single(d) => d.mean().clone(),
            Self::Blocks(blocks) => {
                DVector::from_iterator(
                    self.dimension(),
                    blocks.iter().flat_map(|b| b.mean().iter().cloned()),
                )
            }
        }
    }

    /// Largest covariance eigenvalue over all blocks
    pub fn max_eigenvalue(&self) -> f64 {
        self.as_blocks()
            .iter()
            .map(|b| b.max_eigenvalue())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Exploration magnitude: square root of the largest eigenvalue
    pub fn exploration(&self) -> f64 {
        self.max_eigenvalue().max(0.0).sqrt()
    }

    /// Draw `n_samples` samples of the full parameter vector
    pub fn generate_samples<R: Rng + ?Sized>(
        &self,
        n_samples: usize,
        rng: &mut R,
    ) -> BboResult<DMatrix<f64>> {
        match self {
            Self::Single(d) => d.generate_samples(n_samples, rng),
            Self::Blocks(blocks) => {
                let mut samples = DMatrix::zeros(self.dimension(), n_samples);
                let mut offset = 0;
                for block in blocks {
                    let block_samples = block.generate_samples(n_samples, rng)?;
                    samples
                        .view_mut((offset, 0), (block.dimension(), n_samples))
                        .copy_from(&block_samples);
                    offset += block.dimension();
                }
                Ok(samples)
            }
        }
    }

    /// Build a distribution of the same variant from updated blocks
    pub fn with_blocks(&self, blocks: Vec<DistributionGaussian>) -> BboResult<Self> {
        ensure_dimension(self.num_blocks(), blocks.len())?;
        for (old, new) in self.as_blocks().iter().zip(blocks.iter()) {
            ensure_dimension(old.dimension(), new.dimension())?;
        }

        match self {
            Self::Single(_) => {
                let mut blocks = blocks;
                // Length was checked above
                Ok(Self::Single(blocks.remove(0)))
            }
            Self::Blocks(_) => Ok(Self::Blocks(blocks)),
        }
    }
}

impl From<DistributionGaussian> for SearchDistribution {
    fn from(distribution: DistributionGaussian) -> Self {
        Self::Single(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn block(mean: &[f64], sigma: f64) -> DistributionGaussian {
        DistributionGaussian::isotropic(DVector::from_column_slice(mean), sigma).unwrap()
    }

    #[test]
    fn test_single_wraps_distribution() {
        let search: SearchDistribution = block(&[1.0, 2.0], 1.0).into();
        assert_eq!(search.dimension(), 2);
        assert_eq!(search.num_blocks(), 1);
        assert!(!search.is_blocks());
        assert_eq!(search.block_ranges(), vec![0..2]);
    }

    #[test]
    fn test_empty_blocks_rejected() {
        assert!(matches!(
            SearchDistribution::blocks(vec![]),
            Err(BboError::Precondition(_))
        ));
    }

    #[test]
    fn test_block_layout() {
        let search =
            SearchDistribution::blocks(vec![block(&[1.0, 2.0], 1.0), block(&[3.0], 2.0)]).unwrap();

        assert_eq!(search.dimension(), 3);
        assert_eq!(search.block_dimensions(), vec![2, 1]);
        assert_eq!(search.block_ranges(), vec![0..2, 2..3]);
        assert_eq!(search.mean(), DVector::from_column_slice(&[1.0, 2.0, 3.0]));
        assert_relative_eq!(search.max_eigenvalue(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(search.exploration(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_block_sampling_places_rows() {
        let mut rng = StdRng::seed_from_u64(11);
        let search =
            SearchDistribution::blocks(vec![block(&[10.0, 10.0], 0.0), block(&[-5.0], 0.0)])
                .unwrap();

        let samples = search.generate_samples(4, &mut rng).unwrap();
        assert_eq!(samples.shape(), (3, 4));
        for column in samples.column_iter() {
            assert_relative_eq!(column[0], 10.0);
            assert_relative_eq!(column[1], 10.0);
            assert_relative_eq!(column[2], -5.0);
        }
    }

    #[test]
    fn test_with_blocks_keeps_variant() {
        let single: SearchDistribution = block(&[0.0], 1.0).into();
        let updated = single.with_blocks(vec![block(&[1.0], 1.0)]).unwrap();
        assert!(matches!(updated, SearchDistribution::Single(_)));

        let multi = SearchDistribution::blocks(vec![block(&[0.0], 1.0), block(&[0.0], 1.0)])
            .unwrap();
        let updated = multi
            .with_blocks(vec![block(&[1.0], 1.0), block(&[2.0], 1.0)])
            .unwrap();
        assert!(updated.is_blocks());
        assert_eq!(updated.mean(), DVector::from_column_slice(&[1.0, 2.0]));

        assert!(multi.with_blocks(vec![block(&[1.0], 1.0)]).is_err());
    }

    #[test]
    fn test_deserialize_rejects_empty_blocks() {
        let err = serde_json::from_str::<SearchDistribution>(r#"{"Blocks":[]}"#).unwrap_err();
        assert!(err.to_string().contains("at least one block"), "{}", err);

        let multi = SearchDistribution::blocks(vec![block(&[0.0], 1.0), block(&[1.0, 2.0], 0.5)])
            .unwrap();
        let json = serde_json::to_string(&multi).unwrap();
        assert_eq!(serde_json::from_str::<SearchDistribution>(&json).unwrap(), multi);
    }
}
