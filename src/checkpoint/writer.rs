//! Checkpoint writer
//!
//! Run directory layout:
//!
//! ```text
//! <directory>/
//!   manifest.json
//!   learning_curve.txt          one row per update
//!   update00001/
//!     distribution_mean.txt     distribution before the update
//!     distribution_covariance.txt
//!     cost_eval.txt             cost of the mean
//!     samples.txt               (D, K), one sample per column
//!     costs.txt
//!     weights.txt
//!     distribution_new_mean.txt distribution after the update
//!     distribution_new_covariance.txt
//!   update00002/
//!   ...
//! ```
//!
//! Block distributions write `distribution00_mean.txt`,
//! `distribution01_mean.txt`, ... instead of `distribution_mean.txt`.

use std::path::{Path, PathBuf};

use nalgebra::{DMatrix, DVector};

use super::config::CheckpointConfig;
use super::format::{read_matrix, write_matrix, write_scalar, write_vector};
use super::manifest::{write_manifest, RunManifest};
use crate::diagnostics::{LearningCurve, LearningCurveEntry};
use crate::distribution::SearchDistribution;
use crate::error::PersistenceError;
use crate::optimization::UpdateRecord;

/// File name of the learning curve inside the run directory
pub const LEARNING_CURVE_FILE: &str = "learning_curve.txt";

/// Directory holding the artifacts of one update
pub fn update_directory(directory: impl AsRef<Path>, update: usize) -> PathBuf {
    directory.as_ref().join(format!("update{:05}", update))
}

/// File stem of a distribution block: `distribution` or `distribution03`
pub(super) fn distribution_stem(prefix: &str, block: Option<usize>) -> String {
    match block {
        None => prefix.to_string(),
        Some(b) => format!("{}{:02}", prefix, b),
    }
}

enum Artifact<'a> {
    Matrix(&'a DMatrix<f64>),
    Vector(&'a DVector<f64>),
    Scalar(f64),
}

impl Artifact<'_> {
    fn write(&self, path: &Path) -> Result<(), PersistenceError> {
        match self {
            Self::Matrix(m) => write_matrix(path, m),
            Self::Vector(v) => write_vector(path, v),
            Self::Scalar(s) => write_scalar(path, *s),
        }
    }
}

fn distribution_artifacts<'a>(
    directory: &Path,
    prefix: &str,
    distribution: &'a SearchDistribution,
    artifacts: &mut Vec<(PathBuf, Artifact<'a>)>,
) {
    for (b, block) in distribution.as_blocks().iter().enumerate() {
        let stem = distribution_stem(prefix, distribution.is_blocks().then_some(b));
        artifacts.push((
            directory.join(format!("{}_mean.txt", stem)),
            Artifact::Vector(block.mean()),
        ));
        artifacts.push((
            directory.join(format!("{}_covariance.txt", stem)),
            Artifact::Matrix(block.covariance()),
        ));
    }
}

fn update_artifacts<'a>(directory: &Path, record: &'a UpdateRecord) -> Vec<(PathBuf, Artifact<'a>)> {
    let mut artifacts = Vec::new();
    distribution_artifacts(directory, "distribution", &record.distribution, &mut artifacts);
    artifacts.push((
        directory.join("cost_eval.txt"),
        Artifact::Scalar(record.cost_eval),
    ));
    artifacts.push((directory.join("samples.txt"), Artifact::Matrix(&record.samples)));
    artifacts.push((directory.join("costs.txt"), Artifact::Vector(&record.costs)));
    artifacts.push((directory.join("weights.txt"), Artifact::Vector(&record.weights)));
    distribution_artifacts(
        directory,
        "distribution_new",
        &record.distribution_new,
        &mut artifacts,
    );
    artifacts
}

/// Save all artifacts of one update below `directory`.
///
/// With `overwrite == false` the call fails with
/// [`PersistenceError::AlreadyExists`] before writing anything if any target
/// file is already present.
pub fn save_to_directory(
    directory: impl AsRef<Path>,
    record: &UpdateRecord,
    overwrite: bool,
) -> Result<(), PersistenceError> {
    let update_dir = update_directory(directory, record.update);
    let artifacts = update_artifacts(&update_dir, record);

    if !overwrite {
        if let Some((path, _)) = artifacts.iter().find(|(path, _)| path.exists()) {
            return Err(PersistenceError::AlreadyExists(path.clone()));
        }
    }

    std::fs::create_dir_all(&update_dir)?;
    for (path, artifact) in &artifacts {
        artifact.write(path)?;
    }
    Ok(())
}

/// Writes the run log driven by the optimizer
#[derive(Clone, Debug)]
pub struct CheckpointWriter {
    directory: PathBuf,
    overwrite: bool,
    only_learning_curve: bool,
}

impl CheckpointWriter {
    /// Create a writer from a checkpoint configuration
    pub fn new(config: &CheckpointConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            overwrite: config.overwrite,
            only_learning_curve: config.only_learning_curve,
        }
    }

    /// Root directory of the run log
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the learning curve file
    pub fn learning_curve_path(&self) -> PathBuf {
        self.directory.join(LEARNING_CURVE_FILE)
    }

    /// Prepare the run directory: write the manifest and, when overwriting,
    /// drop the learning curve of an earlier run.
    pub fn start(&self, manifest: &RunManifest) -> Result<(), PersistenceError> {
        write_manifest(&self.directory, manifest, self.overwrite)?;
        let curve_path = self.learning_curve_path();
        if self.overwrite && curve_path.exists() {
            std::fs::remove_file(curve_path)?;
        }
        Ok(())
    }

    /// Persist one update and its learning-curve row.
    ///
    /// Nothing is written if the update was already persisted and overwriting
    /// is disabled.
    pub fn save(
        &self,
        record: &UpdateRecord,
        entry: &LearningCurveEntry,
    ) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.directory)?;

        let curve_path = self.learning_curve_path();
        let mut curve = if curve_path.exists() {
            let matrix = read_matrix(&curve_path)?;
            LearningCurve::from_matrix(&matrix).ok_or_else(|| PersistenceError::Parse {
                path: curve_path.clone(),
                message: format!(
                    "invalid learning curve ({}x{})",
                    matrix.nrows(),
                    matrix.ncols()
                ),
            })?
        } else {
            LearningCurve::new()
        };

        if !self.overwrite && curve.contains(entry.update) {
            return Err(PersistenceError::AlreadyExists(curve_path));
        }

        if !self.only_learning_curve {
            save_to_directory(&self.directory, record, self.overwrite)?;
        }

        curve.record(*entry);
        write_matrix(&curve_path, &curve.to_matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::format::{read_scalar, read_vector};
    use crate::distribution::DistributionGaussian;
    use tempfile::tempdir;

    fn record(update: usize, blocks: bool) -> UpdateRecord {
        let make = |mean: f64| -> SearchDistribution {
            if blocks {
                SearchDistribution::blocks(vec![
                    DistributionGaussian::isotropic(DVector::from_element(1, mean), 1.0).unwrap(),
                    DistributionGaussian::isotropic(DVector::from_element(1, mean), 2.0).unwrap(),
                ])
                .unwrap()
            } else {
                DistributionGaussian::isotropic(DVector::from_element(2, mean), 1.0)
                    .unwrap()
                    .into()
            }
        };
        UpdateRecord {
            update,
            distribution: make(0.0),
            cost_eval: 3.5,
            samples: DMatrix::from_column_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            costs: DVector::from_column_slice(&[5.0, 25.0, 61.0]),
            weights: DVector::from_column_slice(&[0.7, 0.2, 0.1]),
            distribution_new: make(1.0),
        }
    }

    fn writer(directory: &Path, overwrite: bool, only_learning_curve: bool) -> CheckpointWriter {
        CheckpointWriter::new(
            &CheckpointConfig::new(directory)
                .overwrite(overwrite)
                .only_learning_curve(only_learning_curve),
        )
    }

    #[test]
    fn test_update_directory_name() {
        assert_eq!(
            update_directory("/runs/a", 7),
            PathBuf::from("/runs/a/update00007")
        );
    }

    #[test]
    fn test_save_writes_full_layout() {
        let dir = tempdir().unwrap();
        let rec = record(1, false);

        save_to_directory(dir.path(), &rec, false).unwrap();

        let update_dir = update_directory(dir.path(), 1);
        for name in [
            "distribution_mean.txt",
            "distribution_covariance.txt",
            "cost_eval.txt",
            "samples.txt",
            "costs.txt",
            "weights.txt",
            "distribution_new_mean.txt",
            "distribution_new_covariance.txt",
        ] {
            assert!(update_dir.join(name).exists(), "missing {}", name);
        }
        assert_eq!(read_scalar(update_dir.join("cost_eval.txt")).unwrap(), 3.5);
        assert_eq!(read_vector(update_dir.join("weights.txt")).unwrap(), rec.weights);
    }

    #[test]
    fn test_block_file_names() {
        let dir = tempdir().unwrap();
        save_to_directory(dir.path(), &record(2, true), false).unwrap();

        let update_dir = update_directory(dir.path(), 2);
        assert!(update_dir.join("distribution00_mean.txt").exists());
        assert!(update_dir.join("distribution01_covariance.txt").exists());
        assert!(update_dir.join("distribution_new01_mean.txt").exists());
        assert!(!update_dir.join("distribution_mean.txt").exists());
    }

    #[test]
    fn test_overwrite_guard_leaves_files_untouched() {
        let dir = tempdir().unwrap();
        save_to_directory(dir.path(), &record(1, false), false).unwrap();

        let mut second = record(1, false);
        second.cost_eval = -1.0;
        assert!(matches!(
            save_to_directory(dir.path(), &second, false),
            Err(PersistenceError::AlreadyExists(_))
        ));

        let cost = read_scalar(update_directory(dir.path(), 1).join("cost_eval.txt")).unwrap();
        assert_eq!(cost, 3.5);

        save_to_directory(dir.path(), &second, true).unwrap();
        let cost = read_scalar(update_directory(dir.path(), 1).join("cost_eval.txt")).unwrap();
        assert_eq!(cost, -1.0);
    }

    #[test]
    fn test_writer_appends_learning_curve() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path(), false, false);

        for update in 1..=3 {
            let rec = record(update, false);
            w.save(&rec, &rec.learning_curve_entry(update * 3)).unwrap();
        }

        let matrix = read_matrix(w.learning_curve_path()).unwrap();
        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(matrix[(2, 0)], 3.0);
        assert_eq!(matrix[(2, 1)], 9.0);
        assert_eq!(matrix[(2, 2)], 3.5);
    }

    #[test]
    fn test_writer_refuses_duplicate_update() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path(), false, true);
        let rec = record(1, false);
        let entry = rec.learning_curve_entry(3);

        w.save(&rec, &entry).unwrap();
        assert!(matches!(
            w.save(&rec, &entry),
            Err(PersistenceError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_learning_curve_only_skips_update_directories() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path(), false, true);
        let rec = record(1, false);

        w.save(&rec, &rec.learning_curve_entry(3)).unwrap();

        assert!(w.learning_curve_path().exists());
        assert!(!update_directory(dir.path(), 1).exists());
    }

    #[test]
    fn test_start_resets_curve_when_overwriting() {
        let dir = tempdir().unwrap();
        let manifest = RunManifest {
            version: crate::checkpoint::format::FORMAT_VERSION,
            dimension: 2,
            block_dimensions: vec![2],
            n_updates: 1,
            n_samples_per_update: 3,
            updater: "mean".to_string(),
            stochastic_cost: false,
        };

        let first = writer(dir.path(), false, false);
        first.start(&manifest).unwrap();
        let rec = record(5, false);
        first.save(&rec, &rec.learning_curve_entry(15)).unwrap();
        assert!(first.start(&manifest).is_err());

        let second = writer(dir.path(), true, false);
        second.start(&manifest).unwrap();
        assert!(!second.learning_curve_path().exists());
    }
}
