//! Checkpoint reader
//!
//! Loads what [`super::writer`] persisted: single updates, the learning
//! curve, and the list of updates present in a run directory.

use std::path::Path;

use super::format::{read_matrix, read_scalar, read_vector};
use super::writer::{distribution_stem, update_directory, LEARNING_CURVE_FILE};
use crate::diagnostics::LearningCurve;
use crate::distribution::{DistributionGaussian, SearchDistribution};
use crate::error::PersistenceError;
use crate::optimization::UpdateRecord;

/// Load all artifacts of one update
pub fn load_update(
    directory: impl AsRef<Path>,
    update: usize,
) -> Result<UpdateRecord, PersistenceError> {
    let dir = update_directory(directory, update);
    if !dir.is_dir() {
        return Err(PersistenceError::NotFound(dir));
    }

    let distribution = load_distribution(&dir, "distribution")?;
    let distribution_new = load_distribution(&dir, "distribution_new")?;
    let cost_eval = read_scalar(dir.join("cost_eval.txt"))?;
    let samples = read_matrix(dir.join("samples.txt"))?;
    let costs = read_vector(dir.join("costs.txt"))?;
    let weights = read_vector(dir.join("weights.txt"))?;

    let consistent = samples.nrows() == distribution.dimension()
        && samples.ncols() == costs.len()
        && costs.len() == weights.len();
    if !consistent {
        return Err(PersistenceError::Parse {
            path: dir,
            message: format!(
                "inconsistent shapes: samples {}x{}, {} costs, {} weights, dimension {}",
                samples.nrows(),
                samples.ncols(),
                costs.len(),
                weights.len(),
                distribution.dimension()
            ),
        });
    }

    Ok(UpdateRecord {
        update,
        distribution,
        cost_eval,
        samples,
        costs,
        weights,
        distribution_new,
    })
}

/// Load the learning curve of a run
pub fn load_learning_curve(directory: impl AsRef<Path>) -> Result<LearningCurve, PersistenceError> {
    let path = directory.as_ref().join(LEARNING_CURVE_FILE);
    let matrix = read_matrix(&path)?;
    LearningCurve::from_matrix(&matrix).ok_or_else(|| PersistenceError::Parse {
        path,
        message: format!(
            "invalid learning curve ({}x{})",
            matrix.nrows(),
            matrix.ncols()
        ),
    })
}

/// Indices of all updates persisted in a run directory, in ascending order
pub fn list_updates(directory: impl AsRef<Path>) -> Result<Vec<usize>, PersistenceError> {
    let directory = directory.as_ref();
    if !directory.is_dir() {
        return Err(PersistenceError::NotFound(directory.to_path_buf()));
    }

    let mut updates: Vec<usize> = std::fs::read_dir(directory)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            e.file_name()
                .to_str()
                .and_then(|name| name.strip_prefix("update"))
                .and_then(|index| index.parse::<usize>().ok())
        })
        .collect();
    updates.sort_unstable();
    Ok(updates)
}

fn load_distribution(dir: &Path, prefix: &str) -> Result<SearchDistribution, PersistenceError> {
    let single = distribution_stem(prefix, None);
    if dir.join(format!("{}_mean.txt", single)).exists() {
        return Ok(SearchDistribution::Single(load_gaussian(dir, &single)?));
    }

    let mut blocks = Vec::new();
    loop {
        let stem = distribution_stem(prefix, Some(blocks.len()));
        if !dir.join(format!("{}_mean.txt", stem)).exists() {
            break;
        }
        blocks.push(load_gaussian(dir, &stem)?);
    }

    if blocks.is_empty() {
        return Err(PersistenceError::NotFound(
            dir.join(format!("{}_mean.txt", single)),
        ));
    }
    Ok(SearchDistribution::Blocks(blocks))
}

fn load_gaussian(dir: &Path, stem: &str) -> Result<DistributionGaussian, PersistenceError> {
    let mean_path = dir.join(format!("{}_mean.txt", stem));
    let mean = read_vector(&mean_path)?;
    let covariance = read_matrix(dir.join(format!("{}_covariance.txt", stem)))?;
    DistributionGaussian::new(mean, covariance).map_err(|e| PersistenceError::Parse {
        path: mean_path,
        message: e.to_string(),
    })
}
