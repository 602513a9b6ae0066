//! Cost-to-weight transforms
//!
//! Every method maps lower costs to higher (or equal) weights, gives equal
//! weights to equal costs, and normalizes the result to sum to 1.

use std::cmp::Ordering;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{BboError, BboResult};

/// Default eliteness for exponential weighting
pub const DEFAULT_ELITENESS: f64 = 10.0;

/// How costs are converted into weights
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum WeightingMethod {
    /// Exponential in normalized cost (PI-BB / PI²):
    /// `w = exp(-h · (c − c_min) / (c_max − c_min))`.
    ///
    /// Larger `eliteness` (h) concentrates weight on the cheapest samples;
    /// `0` gives uniform weights.
    PiBb { eliteness: f64 },
    /// Cross-entropy method: uniform weight on the `eliteness` cheapest
    /// samples, zero elsewhere. Samples tied with the last elite are elite too.
    Cem { eliteness: usize },
    /// CMA-ES rank weights `ln(μ + ½) − ln(r + 1)` for the `eliteness` = μ
    /// best ranks `r`. Tied costs share the mean weight of their ranks.
    CmaEs { eliteness: usize },
}

impl Default for WeightingMethod {
    fn default() -> Self {
        Self::PiBb {
            eliteness: DEFAULT_ELITENESS,
        }
    }
}

impl WeightingMethod {
    /// Check the method's parameters
    pub fn validate(&self) -> BboResult<()> {
        match *self {
            Self::PiBb { eliteness } => {
                if !eliteness.is_finite() || eliteness < 0.0 {
                    return Err(BboError::Precondition(format!(
                        "eliteness must be finite and non-negative, got {}",
                        eliteness
                    )));
                }
            }
            Self::Cem { eliteness } | Self::CmaEs { eliteness } => {
                if eliteness == 0 {
                    return Err(BboError::Precondition(
                        "number of elite samples must be at least 1".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Convert costs into normalized weights
    pub fn costs_to_weights(&self, costs: &DVector<f64>) -> BboResult<DVector<f64>> {
        self.validate()?;
        if costs.is_empty() {
            return Err(BboError::Precondition(
                "cannot compute weights for an empty cost vector".to_string(),
            ));
        }
        if let Some(bad) = costs.iter().find(|c| !c.is_finite()) {
            return Err(BboError::Numerical(format!(
                "costs contain a non-finite value ({})",
                bad
            )));
        }

        let weights = match *self {
            Self::PiBb { eliteness } => pi_bb_weights(costs, eliteness),
            Self::Cem { eliteness } => cem_weights(costs, eliteness),
            Self::CmaEs { eliteness } => cma_es_weights(costs, eliteness),
        };

        normalize(weights)
    }
}

fn pi_bb_weights(costs: &DVector<f64>, eliteness: f64) -> DVector<f64> {
    // Work on halved costs so the spread of two finite costs stays finite
    let half_min = costs.min() * 0.5;
    let half_range = costs.max() * 0.5 - half_min;
    if half_range <= 0.0 {
        return DVector::from_element(costs.len(), 1.0);
    }
    costs.map(|c| (-eliteness * (c * 0.5 - half_min) / half_range).exp())
}

fn cem_weights(costs: &DVector<f64>, eliteness: usize) -> DVector<f64> {
    let mu = eliteness.min(costs.len());
    let order = ascending_order(costs);
    let threshold = costs[order[mu - 1]];
    costs.map(|c| if c <= threshold { 1.0 } else { 0.0 })
}

fn cma_es_weights(costs: &DVector<f64>, eliteness: usize) -> DVector<f64> {
    let n = costs.len();
    let mu = eliteness.min(n);
    let rank_weight = |rank: usize| -> f64 {
        if rank < mu {
            (mu as f64 + 0.5).ln() - ((rank + 1) as f64).ln()
        } else {
            0.0
        }
    };

    let order = ascending_order(costs);
    let mut weights = DVector::zeros(n);
    let mut start = 0;
    while start < n {
        // Group of samples sharing the same cost
        let mut end = start + 1;
        while end < n && costs[order[end]] == costs[order[start]] {
            end += 1;
        }
        let shared = (start..end).map(rank_weight).sum::<f64>() / (end - start) as f64;
        for &index in &order[start..end] {
            weights[index] = shared;
        }
        start = end;
    }
    weights
}

/// Sample indices sorted by increasing cost (stable for ties)
fn ascending_order(costs: &DVector<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..costs.len()).collect();
    order.sort_by(|&a, &b| costs[a].partial_cmp(&costs[b]).unwrap_or(Ordering::Equal));
    order
}

fn normalize(weights: DVector<f64>) -> BboResult<DVector<f64>> {
    let sum = weights.sum();
    if !sum.is_finite() || sum <= 0.0 {
        return Err(BboError::Numerical(format!(
            "weights cannot be normalized (sum = {})",
            sum
        )));
    }
    Ok(weights / sum)
}
