//! Checkpointing
//!
//! This example persists every update of a run to disk and inspects the log
//! afterwards: the learning curve, one full update, and the run manifest.

use gauss_bbo::prelude::*;
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("gauss_bbo=debug").init();

    println!("=== Checkpointing ===\n");

    let run_dir = PathBuf::from("/tmp/gauss_bbo_run");
    let mut rng = StdRng::seed_from_u64(7);

    // Two independent blocks: a 2-D block and a 1-D block
    let initial = SearchDistribution::blocks(vec![
        DistributionGaussian::isotropic(DVector::from_column_slice(&[2.0, -1.0]), 0.5)?,
        DistributionGaussian::diagonal(
            DVector::from_column_slice(&[4.0]),
            DVector::from_column_slice(&[1.0]),
        )?,
    ])?;

    let result = run_optimization(
        PerSampleCost::new(|x: &[f64]| x.iter().map(|v| v * v).sum::<f64>()).with_dimension(3),
        initial,
        UpdaterCovarDecay::new(WeightingMethod::default(), 0.9),
        20,
        12,
        Some(CheckpointConfig::new(&run_dir).overwrite(true)),
        &mut rng,
    )?;

    for failure in &result.persistence_failures {
        println!("Update {} not persisted: {}", failure.update, failure.message);
    }

    let curve = load_learning_curve(&run_dir)?;
    println!("Learning curve ({} updates):", curve.len());
    for entry in curve.entries() {
        println!(
            "  update {:>3}  samples {:>4}  cost {:>12.6}  exploration {:.4}",
            entry.update, entry.n_samples, entry.cost_eval, entry.exploration
        );
    }

    let updates = list_updates(&run_dir)?;
    if let Some(&last) = updates.last() {
        let record = load_update(&run_dir, last)?;
        println!("\nUpdate {}:", record.update);
        println!("  cost of mean: {:.6}", record.cost_eval);
        println!("  best sample cost: {:.6}", record.costs.min());
        println!("  largest weight: {:.4}", record.weights.max());
        println!("  new mean: {}", record.distribution_new.mean().transpose());
    }

    let manifest = load_manifest(&run_dir)?;
    println!(
        "\nManifest: v{}, dimension {}, blocks {:?}, updater {}",
        manifest.version, manifest.dimension, manifest.block_dimensions, manifest.updater
    );

    std::fs::remove_dir_all(&run_dir)?;
    println!("\nRun directory cleaned up.");

    Ok(())
}
