//! Run manifest
//!
//! A small JSON document at the root of the run directory describing how the
//! run was configured and which format version its files use.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::format::FORMAT_VERSION;
use crate::error::PersistenceError;

/// File name of the manifest inside the run directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Description of a persisted run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Format version of every file in the run directory
    pub version: u32,
    /// Total parameter dimension
    pub dimension: usize,
    /// Dimension of each distribution block
    pub block_dimensions: Vec<usize>,
    /// Number of updates requested
    pub n_updates: usize,
    /// Samples per update
    pub n_samples_per_update: usize,
    /// Name of the update policy
    pub updater: String,
    /// Whether the cost function declared itself stochastic
    pub stochastic_cost: bool,
}

impl RunManifest {
    /// Whether this manifest can be read by the current version
    pub fn is_compatible(&self) -> bool {
        self.version == FORMAT_VERSION
    }
}

/// Write the manifest into `directory`
pub fn write_manifest(
    directory: impl AsRef<Path>,
    manifest: &RunManifest,
    overwrite: bool,
) -> Result<(), PersistenceError> {
    let directory = directory.as_ref();
    std::fs::create_dir_all(directory)?;

    let path = directory.join(MANIFEST_FILE);
    if !overwrite && path.exists() {
        return Err(PersistenceError::AlreadyExists(path));
    }

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, manifest)
        .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Load the manifest from `directory`
pub fn load_manifest(directory: impl AsRef<Path>) -> Result<RunManifest, PersistenceError> {
    let path = directory.as_ref().join(MANIFEST_FILE);
    if !path.exists() {
        return Err(PersistenceError::NotFound(path));
    }

    let reader = BufReader::new(File::open(&path)?);
    let manifest: RunManifest =
        serde_json::from_reader(reader).map_err(|e| PersistenceError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;

    if !manifest.is_compatible() {
        return Err(PersistenceError::UnsupportedVersion {
            found: manifest.version,
            supported: FORMAT_VERSION,
        });
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manifest() -> RunManifest {
        RunManifest {
            version: FORMAT_VERSION,
            dimension: 3,
            block_dimensions: vec![2, 1],
            n_updates: 10,
            n_samples_per_update: 8,
            updater: "mean".to_string(),
            stochastic_cost: false,
        }
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), &manifest(), false).unwrap();
        assert_eq!(load_manifest(dir.path()).unwrap(), manifest());
    }

    #[test]
    fn test_manifest_overwrite_guard() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), &manifest(), false).unwrap();

        let mut changed = manifest();
        changed.n_updates = 99;
        assert!(matches!(
            write_manifest(dir.path(), &changed, false),
            Err(PersistenceError::AlreadyExists(_))
        ));
        assert_eq!(load_manifest(dir.path()).unwrap().n_updates, 10);

        write_manifest(dir.path(), &changed, true).unwrap();
        assert_eq!(load_manifest(dir.path()).unwrap().n_updates, 99);
    }

    #[test]
    fn test_newer_manifest_rejected() {
        let dir = tempdir().unwrap();
        let mut newer = manifest();
        newer.version = FORMAT_VERSION + 1;
        write_manifest(dir.path(), &newer, false).unwrap();

        assert!(matches!(
            load_manifest(dir.path()),
            Err(PersistenceError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_older_manifest_rejected() {
        let dir = tempdir().unwrap();
        let mut older = manifest();
        older.version = 0;
        write_manifest(dir.path(), &older, false).unwrap();

        assert!(matches!(
            load_manifest(dir.path()),
            Err(PersistenceError::UnsupportedVersion { found: 0, .. })
        ));
    }
}
