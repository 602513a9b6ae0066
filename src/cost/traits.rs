//! Cost function traits
//!
//! The primary contract is batched: a cost function receives a (D, K) sample
//! matrix and returns K costs, so implementations can amortize fixed overhead
//! across a whole batch. Lower cost is better.

use nalgebra::{DMatrix, DVector};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ensure_dimension, BboError, BboResult};

/// Batched cost function
pub trait CostFunction {
    /// Evaluate every column of `samples`; entry `k` of the result is the
    /// cost of column `k`.
    fn evaluate(&self, samples: &DMatrix<f64>) -> BboResult<DVector<f64>>;

    /// Parameter dimension this cost function expects, if known up front
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Whether repeated evaluation of the same sample may give different costs
    fn is_stochastic(&self) -> bool {
        false
    }

    /// Evaluate a single parameter vector
    fn evaluate_single(&self, x: &DVector<f64>) -> BboResult<f64> {
        let samples = DMatrix::from_column_slice(x.len(), 1, x.as_slice());
        let costs = self.evaluate(&samples)?;
        ensure_dimension(1, costs.len())?;
        Ok(costs[0])
    }
}

impl<C: CostFunction + ?Sized> CostFunction for &C {
    fn evaluate(&self, samples: &DMatrix<f64>) -> BboResult<DVector<f64>> {
        (**self).evaluate(samples)
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }

    fn is_stochastic(&self) -> bool {
        (**self).is_stochastic()
    }
}

impl<C: CostFunction + ?Sized> CostFunction for Box<C> {
    fn evaluate(&self, samples: &DMatrix<f64>) -> BboResult<DVector<f64>> {
        (**self).evaluate(samples)
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }

    fn is_stochastic(&self) -> bool {
        (**self).is_stochastic()
    }
}

/// Cost of a single parameter vector
#[cfg(feature = "parallel")]
pub trait SampleCost: Send + Sync {
    /// Evaluate one sample (lower is better)
    fn cost(&self, sample: &[f64]) -> f64;
}

/// Cost of a single parameter vector
#[cfg(not(feature = "parallel"))]
pub trait SampleCost {
    /// Evaluate one sample (lower is better)
    fn cost(&self, sample: &[f64]) -> f64;
}

/// Implement SampleCost for any Fn that matches the signature
#[cfg(feature = "parallel")]
impl<F> SampleCost for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn cost(&self, sample: &[f64]) -> f64 {
        self(sample)
    }
}

/// Implement SampleCost for any Fn that matches the signature
#[cfg(not(feature = "parallel"))]
impl<F> SampleCost for F
where
    F: Fn(&[f64]) -> f64,
{
    fn cost(&self, sample: &[f64]) -> f64 {
        self(sample)
    }
}

/// Adapts a per-sample cost to the batched `CostFunction` contract
///
/// The declared dimension, if any, is checked lazily on every batch. With the
/// `parallel` feature the columns can be evaluated concurrently; costs are
/// always returned in column order.
pub struct PerSampleCost<C> {
    inner: C,
    dimension: Option<usize>,
    stochastic: bool,
    parallel: bool,
}

impl<C: SampleCost> PerSampleCost<C> {
    /// Wrap a per-sample cost function
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            dimension: None,
            stochastic: false,
            parallel: false,
        }
    }

    /// Declare the expected parameter dimension
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Declare the cost function as stochastic
    pub fn stochastic(mut self, stochastic: bool) -> Self {
        self.stochastic = stochastic;
        self
    }

    /// Evaluate columns in parallel
    #[cfg(feature = "parallel")]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether parallel evaluation is enabled
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Get the wrapped cost function
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn cost_of_column(&self, samples: &DMatrix<f64>, k: usize) -> f64 {
        let sample: Vec<f64> = samples.column(k).iter().copied().collect();
        self.inner.cost(&sample)
    }
}

impl<C: SampleCost> CostFunction for PerSampleCost<C> {
    fn evaluate(&self, samples: &DMatrix<f64>) -> BboResult<DVector<f64>> {
        if let Some(expected) = self.dimension {
            ensure_dimension(expected, samples.nrows())?;
        }
        if samples.ncols() == 0 {
            return Err(BboError::Precondition(
                "cannot evaluate an empty sample batch".to_string(),
            ));
        }

        #[cfg(feature = "parallel")]
        if self.parallel {
            let costs: Vec<f64> = (0..samples.ncols())
                .into_par_iter()
                .map(|k| self.cost_of_column(samples, k))
                .collect();
            return Ok(DVector::from_vec(costs));
        }

        let costs: Vec<f64> = (0..samples.ncols())
            .map(|k| self.cost_of_column(samples, k))
            .collect();
        Ok(DVector::from_vec(costs))
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn is_stochastic(&self) -> bool {
        self.stochastic
    }
}
