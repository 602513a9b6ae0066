//! Optimization loop
//!
//! The optimizer owns the single live search distribution and drives the
//! sample → evaluate → update cycle for a fixed number of updates, handing
//! every update to the checkpoint writer when persistence is enabled.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::OptimizationConfig;
use super::record::UpdateRecord;
use crate::checkpoint::{
    CheckpointConfig, CheckpointWriter, PersistencePolicy, RunManifest, FORMAT_VERSION,
};
use crate::cost::CostFunction;
use crate::diagnostics::{LearningCurve, LearningCurveEntry};
use crate::distribution::SearchDistribution;
use crate::error::{BboError, BboResult, PersistenceError};
use crate::updater::Updater;

/// A checkpoint write that failed without aborting the run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistenceFailure {
    /// Update whose artifacts could not be written
    pub update: usize,
    /// Error description
    pub message: String,
}

/// Outcome of an optimization run
#[derive(Clone, Debug)]
pub struct OptimizationResult {
    /// Distribution after the last update
    pub distribution: SearchDistribution,
    /// Mean cost and exploration per update
    pub learning_curve: LearningCurve,
    /// Checkpoint writes that failed under [`PersistencePolicy::Continue`]
    pub persistence_failures: Vec<PersistenceFailure>,
    /// Number of updates performed
    pub n_updates: usize,
    /// Total number of sampled cost evaluations
    pub n_samples: usize,
    /// Wall-clock duration of the run
    pub runtime: Duration,
}

impl OptimizationResult {
    /// Whether every enabled checkpoint write succeeded
    pub fn is_fully_persisted(&self) -> bool {
        self.persistence_failures.is_empty()
    }
}

/// Builder for [`Optimizer`]
pub struct OptimizerBuilder<C, U> {
    config: OptimizationConfig,
    distribution: Option<SearchDistribution>,
    cost: Option<C>,
    updater: Option<U>,
}

impl OptimizerBuilder<(), ()> {
    /// Create a new builder with default loop parameters
    pub fn new() -> Self {
        Self {
            config: OptimizationConfig::default(),
            distribution: None,
            cost: None,
            updater: None,
        }
    }
}

impl Default for OptimizerBuilder<(), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, U> OptimizerBuilder<C, U> {
    /// Set the number of updates
    pub fn n_updates(mut self, n: usize) -> Self {
        self.config.n_updates = n;
        self
    }

    /// Set the number of samples per update
    pub fn n_samples_per_update(mut self, n: usize) -> Self {
        self.config.n_samples_per_update = n;
        self
    }

    /// Enable checkpointing
    pub fn checkpoint(mut self, checkpoint: CheckpointConfig) -> Self {
        self.config.checkpoint = Some(checkpoint);
        self
    }

    /// Replace all loop parameters
    pub fn config(mut self, config: OptimizationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the initial search distribution
    pub fn distribution(mut self, distribution: impl Into<SearchDistribution>) -> Self {
        self.distribution = Some(distribution.into());
        self
    }

    /// Set the cost function
    pub fn cost<NewC>(self, cost: NewC) -> OptimizerBuilder<NewC, U>
    where
        NewC: CostFunction,
    {
        OptimizerBuilder {
            config: self.config,
            distribution: self.distribution,
            cost: Some(cost),
            updater: self.updater,
        }
    }

    /// Set the update policy
    pub fn updater<NewU>(self, updater: NewU) -> OptimizerBuilder<C, NewU>
    where
        NewU: Updater,
    {
        OptimizerBuilder {
            config: self.config,
            distribution: self.distribution,
            cost: self.cost,
            updater: Some(updater),
        }
    }
}

impl<C, U> OptimizerBuilder<C, U>
where
    C: CostFunction,
    U: Updater,
{
    /// Validate the configuration and build the optimizer
    pub fn build(self) -> BboResult<Optimizer<C, U>> {
        let distribution = self.distribution.ok_or_else(|| {
            BboError::Precondition("Initial distribution must be specified".to_string())
        })?;
        let cost = self
            .cost
            .ok_or_else(|| BboError::Precondition("Cost function must be specified".to_string()))?;
        let updater = self
            .updater
            .ok_or_else(|| BboError::Precondition("Updater must be specified".to_string()))?;

        self.config.validate()?;
        updater.validate()?;

        if let Some(expected) = cost.dimension() {
            if expected != distribution.dimension() {
                return Err(BboError::DimensionMismatch {
                    expected,
                    actual: distribution.dimension(),
                });
            }
        }

        Ok(Optimizer {
            config: self.config,
            initial: distribution,
            cost,
            updater,
        })
    }
}

/// Evolutionary optimizer over a Gaussian search distribution
pub struct Optimizer<C, U> {
    config: OptimizationConfig,
    initial: SearchDistribution,
    cost: C,
    updater: U,
}

impl Optimizer<(), ()> {
    /// Create a builder
    pub fn builder() -> OptimizerBuilder<(), ()> {
        OptimizerBuilder::new()
    }
}

impl<C, U> Optimizer<C, U>
where
    C: CostFunction,
    U: Updater,
{
    /// Loop parameters
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Distribution the run starts from
    pub fn initial_distribution(&self) -> &SearchDistribution {
        &self.initial
    }

    /// The cost function
    pub fn cost(&self) -> &C {
        &self.cost
    }

    /// The update policy
    pub fn updater(&self) -> &U {
        &self.updater
    }

    /// Manifest describing this run on disk
    pub fn manifest(&self) -> RunManifest {
        RunManifest {
            version: FORMAT_VERSION,
            dimension: self.initial.dimension(),
            block_dimensions: self.initial.block_dimensions(),
            n_updates: self.config.n_updates,
            n_samples_per_update: self.config.n_samples_per_update,
            updater: self.updater.name().to_string(),
            stochastic_cost: self.cost.is_stochastic(),
        }
    }

    /// Perform one update starting from `distribution`.
    ///
    /// The distribution is moved into the returned record; the next
    /// distribution is `record.distribution_new`.
    pub fn step<R: Rng + ?Sized>(
        &self,
        update: usize,
        distribution: SearchDistribution,
        rng: &mut R,
    ) -> BboResult<UpdateRecord> {
        let n_samples = self.config.n_samples_per_update;

        let cost_eval = self.cost.evaluate_single(&distribution.mean())?;

        let samples = distribution.generate_samples(n_samples, rng)?;
        let costs = self.cost.evaluate(&samples)?;
        if costs.len() != n_samples {
            return Err(BboError::CostEvaluation(format!(
                "cost function returned {} costs for {} samples",
                costs.len(),
                n_samples
            )));
        }

        let outcome = self
            .updater
            .update_distributions(&distribution, &samples, &costs)?;

        Ok(UpdateRecord {
            update,
            distribution,
            cost_eval,
            samples,
            costs,
            weights: outcome.weights,
            distribution_new: outcome.distribution,
        })
    }

    /// Run all updates
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> BboResult<OptimizationResult> {
        let start_time = Instant::now();
        let writer = self.config.checkpoint.as_ref().map(CheckpointWriter::new);

        info!(
            dimension = self.initial.dimension(),
            blocks = self.initial.num_blocks(),
            n_updates = self.config.n_updates,
            n_samples_per_update = self.config.n_samples_per_update,
            updater = self.updater.name(),
            checkpoint = writer.is_some(),
            "starting optimization"
        );

        let mut distribution = self.initial.clone();
        let mut learning_curve = LearningCurve::new();
        let mut persistence_failures = Vec::new();
        let mut n_samples = 0usize;

        for update in 1..=self.config.n_updates {
            let record = self.step(update, distribution, rng)?;
            n_samples += record.n_samples();

            let entry = record.learning_curve_entry(n_samples);
            learning_curve.record(entry);

            debug!(
                update,
                cost_eval = entry.cost_eval,
                exploration = entry.exploration,
                n_samples,
                "update complete"
            );

            if let Some(writer) = &writer {
                self.persist(writer, &record, &entry, &mut persistence_failures)?;
            }

            distribution = record.distribution_new;
        }

        let runtime = start_time.elapsed();
        info!(
            n_samples,
            final_cost = ?learning_curve.final_cost(),
            best_cost = ?learning_curve.best_cost(),
            persistence_failures = persistence_failures.len(),
            runtime_ms = runtime.as_millis() as u64,
            "optimization finished"
        );

        Ok(OptimizationResult {
            distribution,
            learning_curve,
            persistence_failures,
            n_updates: self.config.n_updates,
            n_samples,
            runtime,
        })
    }

    // The manifest goes out together with the first update, so a run that
    // fails before its first update leaves nothing on disk.
    fn persist(
        &self,
        writer: &CheckpointWriter,
        record: &UpdateRecord,
        entry: &LearningCurveEntry,
        failures: &mut Vec<PersistenceFailure>,
    ) -> BboResult<()> {
        if record.update == 1 {
            if let Err(error) = writer.start(&self.manifest()) {
                self.handle_persistence(record.update, error, failures)?;
            }
        }
        if let Err(error) = writer.save(record, entry) {
            self.handle_persistence(record.update, error, failures)?;
        }
        Ok(())
    }

    fn handle_persistence(
        &self,
        update: usize,
        error: PersistenceError,
        failures: &mut Vec<PersistenceFailure>,
    ) -> BboResult<()> {
        let policy = self
            .config
            .checkpoint
            .as_ref()
            .map_or(PersistencePolicy::default(), |c| c.on_failure);

        match policy {
            PersistencePolicy::Abort => Err(error.into()),
            PersistencePolicy::Continue => {
                warn!(update, error = %error, "checkpoint write failed, continuing");
                failures.push(PersistenceFailure {
                    update,
                    message: error.to_string(),
                });
                Ok(())
            }
        }
    }
}

/// Run an optimization with explicit dependencies.
///
/// Convenience wrapper around [`OptimizerBuilder`].
pub fn run_optimization<C, U, R>(
    cost: C,
    initial_distribution: impl Into<SearchDistribution>,
    updater: U,
    n_updates: usize,
    n_samples_per_update: usize,
    checkpoint: Option<CheckpointConfig>,
    rng: &mut R,
) -> BboResult<OptimizationResult>
where
    C: CostFunction,
    U: Updater,
    R: Rng + ?Sized,
{
    Optimizer::builder()
        .config(OptimizationConfig {
            n_updates,
            n_samples_per_update,
            checkpoint,
        })
        .distribution(initial_distribution)
        .cost(cost)
        .updater(updater)
        .build()?
        .run(rng)
}
