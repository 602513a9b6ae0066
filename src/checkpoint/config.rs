//! Checkpoint configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What the optimizer does when a checkpoint write fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistencePolicy {
    /// Log and record the failure, keep optimizing
    #[default]
    Continue,
    /// Abort the run with the persistence error
    Abort,
}

/// Where and how a run is persisted
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Root directory of the run log
    pub directory: PathBuf,
    /// Replace files left by an earlier run
    #[serde(default)]
    pub overwrite: bool,
    /// Write only the learning curve, not per-update artifacts
    #[serde(default)]
    pub only_learning_curve: bool,
    /// Failure handling
    #[serde(default)]
    pub on_failure: PersistencePolicy,
}

impl CheckpointConfig {
    /// Full checkpointing into `directory`, refusing to overwrite
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            overwrite: false,
            only_learning_curve: false,
            on_failure: PersistencePolicy::Continue,
        }
    }

    /// Allow replacing existing files
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Only write the learning curve
    pub fn only_learning_curve(mut self, only: bool) -> Self {
        self.only_learning_curve = only;
        self
    }

    /// Set the failure policy
    pub fn on_failure(mut self, policy: PersistencePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}
