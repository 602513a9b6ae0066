//! Optimization configuration

use serde::{Deserialize, Serialize};

use crate::checkpoint::CheckpointConfig;
use crate::error::{BboError, BboResult};

/// Loop parameters of an optimization run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Number of distribution updates
    pub n_updates: usize,
    /// Samples drawn and evaluated per update
    pub n_samples_per_update: usize,
    /// Checkpointing, disabled when absent
    #[serde(default)]
    pub checkpoint: Option<CheckpointConfig>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            n_updates: 50,
            n_samples_per_update: 20,
            checkpoint: None,
        }
    }
}

impl OptimizationConfig {
    /// Check the loop parameters
    pub fn validate(&self) -> BboResult<()> {
        if self.n_updates == 0 {
            return Err(BboError::Precondition(
                "n_updates must be at least 1".to_string(),
            ));
        }
        if self.n_samples_per_update == 0 {
            return Err(BboError::Precondition(
                "n_samples_per_update must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON
    pub fn from_json(json: &str) -> BboResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            BboError::Precondition(format!("invalid optimization configuration: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}
