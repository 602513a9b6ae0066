//! Quadratic Optimization
//!
//! This example minimizes ||x||² in ten dimensions with each of the three
//! update policies and compares their learning curves.

use gauss_bbo::prelude::*;
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

const DIM: usize = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gauss_bbo=info".parse()?))
        .init();

    println!("=== Quadratic Optimization ===\n");

    let updaters: Vec<(&str, Box<dyn Updater>)> = vec![
        ("mean only", Box::new(UpdaterMean::with_eliteness(10.0))),
        (
            "covariance decay",
            Box::new(UpdaterCovarDecay::new(WeightingMethod::default(), 0.95)),
        ),
        (
            "covariance adaptation",
            Box::new(UpdaterCovarAdaptation::new(WeightingMethod::CmaEs {
                eliteness: 5,
            })),
        ),
    ];

    for (label, updater) in updaters {
        let mut rng = StdRng::seed_from_u64(42);
        let initial = DistributionGaussian::isotropic(DVector::from_element(DIM, 3.0), 1.0)?;

        let result = Optimizer::builder()
            .distribution(initial)
            .cost(CostFunctionQuadratic::origin(DIM))
            .updater(updater)
            .n_updates(100)
            .n_samples_per_update(20)
            .build()?
            .run(&mut rng)?;

        println!("--- {} ---", label);
        println!("{}", result.learning_curve.summary());
        println!(
            "Final exploration: {:.6}",
            result.distribution.exploration()
        );
        println!("Runtime: {:?}\n", result.runtime);
    }

    Ok(())
}
