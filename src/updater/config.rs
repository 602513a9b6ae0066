//! Updater configuration
//!
//! Serializable selection of an update policy, so runs can be described in
//! JSON and recorded next to their checkpoints.

use serde::{Deserialize, Serialize};

use super::covar_adaptation::UpdaterCovarAdaptation;
use super::covar_decay::UpdaterCovarDecay;
use super::mean::UpdaterMean;
use super::traits::Updater;
use crate::error::{BboError, BboResult};

/// Serializable choice of update policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdaterConfig {
    /// Mean only, fixed covariance
    Mean(UpdaterMean),
    /// Mean plus geometric covariance decay
    CovarDecay(UpdaterCovarDecay),
    /// Mean plus full covariance adaptation
    CovarAdaptation(UpdaterCovarAdaptation),
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self::Mean(UpdaterMean::default())
    }
}

impl UpdaterConfig {
    /// Validate the parameters and construct the updater
    pub fn build(&self) -> BboResult<Box<dyn Updater>> {
        let updater: Box<dyn Updater> = match self {
            Self::Mean(u) => Box::new(u.clone()),
            Self::CovarDecay(u) => Box::new(u.clone()),
            Self::CovarAdaptation(u) => Box::new(u.clone()),
        };
        updater.validate()?;
        Ok(updater)
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> BboResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BboError::Precondition(format!("invalid updater configuration: {}", e)))
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> BboResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BboError::Precondition(format!("cannot serialize updater: {}", e)))
    }
}

impl From<UpdaterMean> for UpdaterConfig {
    fn from(updater: UpdaterMean) -> Self {
        Self::Mean(updater)
    }
}

impl From<UpdaterCovarDecay> for UpdaterConfig {
    fn from(updater: UpdaterCovarDecay) -> Self {
        Self::CovarDecay(updater)
    }
}

impl From<UpdaterCovarAdaptation> for UpdaterConfig {
    fn from(updater: UpdaterCovarAdaptation) -> Self {
        Self::CovarAdaptation(updater)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::weighting::WeightingMethod;

    #[test]
    fn test_build_each_variant() {
        let configs: Vec<UpdaterConfig> = vec![
            UpdaterMean::with_eliteness(5.0).into(),
            UpdaterCovarDecay::new(WeightingMethod::default(), 0.9).into(),
            UpdaterCovarAdaptation::new(WeightingMethod::CmaEs { eliteness: 5 }).into(),
        ];
        let names: Vec<&str> = configs
            .iter()
            .map(|c| c.build().unwrap().name())
            .collect();
        assert_eq!(names, vec!["mean", "covar_decay", "covar_adaptation"]);
    }

    #[test]
    fn test_build_rejects_invalid_parameters() {
        let config: UpdaterConfig = UpdaterCovarDecay::new(WeightingMethod::default(), 2.0).into();
        assert!(matches!(config.build(), Err(BboError::Precondition(_))));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "type": "covar_adaptation",
            "weighting": { "method": "pi_bb", "eliteness": 10.0 },
            "learning_rate": 0.8,
            "min_level": 0.001
        }"#;

        let config = UpdaterConfig::from_json(json).unwrap();

        match &config {
            UpdaterConfig::CovarAdaptation(u) => {
                assert_eq!(u.learning_rate, 0.8);
                assert_eq!(u.max_level, None);
                assert!(!u.diagonal_only);
            }
            other => panic!("unexpected config {:?}", other),
        }
        let reparsed = UpdaterConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_mean_defaults_from_json() {
        let config = UpdaterConfig::from_json(r#"{ "type": "mean" }"#).unwrap();
        assert_eq!(config, UpdaterConfig::default());
    }
}
