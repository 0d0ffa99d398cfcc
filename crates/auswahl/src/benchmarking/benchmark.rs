use std::collections::BTreeSet;
use std::time::Instant;

use ndarray::Axis;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::benchmarking::data_handling::{DataHandler, Dataset};
use crate::benchmarking::stability::StabilityScore;
use crate::error::{AuswahlError, Result};
use crate::feature_selection::selector::{FeatureDescriptor, FeatureSelector};
use crate::metrics::RegressionMetric;
use crate::model_selection::train_test_split;
use crate::models::regressor_trait::RegressionModel;

/// Benchmark selection methods across datasets and feature configurations.
///
/// Every run draws a seed from the master RNG, splits each dataset with it and
/// reseeds every method with it. For each feature configuration a method is
/// fitted on the training split (timed), and its selection is evaluated by
/// fitting a fresh copy of `test_model` on the selected training wavelengths
/// and scoring its predictions on the test split with every metric in
/// `reg_metrics`. Once all runs are done, every stability score is evaluated.
///
/// # Arguments
///
/// * `datasets` - Datasets with unique names.
/// * `features` - Feature configurations every method is benchmarked with.
/// * `n_runs` - Number of repetitions with different seeds.
/// * `reg_metrics` - Regression metrics evaluated on the test split.
/// * `stab_metrics` - Stability scores evaluated over the runs.
/// * `methods` - Selection methods with unique names.
/// * `test_model` - Template of the model evaluating a selection.
/// * `random_state` - Seed of the master RNG; entropy when `None`.
#[allow(clippy::too_many_arguments)]
pub fn benchmark(
    datasets: &[Dataset],
    features: &[FeatureDescriptor],
    n_runs: usize,
    reg_metrics: &[RegressionMetric],
    stab_metrics: &[Box<dyn StabilityScore>],
    methods: &mut [Box<dyn FeatureSelector>],
    test_model: &dyn RegressionModel,
    random_state: Option<u64>,
) -> Result<DataHandler> {
    if n_runs == 0 {
        return Err(AuswahlError::InvalidConfig("n_runs must be at least 1".to_string()));
    }
    let dataset_names = unique_names("dataset", datasets.iter().map(|d| d.name.clone()))?;
    let method_names = unique_names("method", methods.iter().map(|m| m.name().to_string()))?;
    let reg_names: Vec<String> = reg_metrics.iter().map(|m| m.name.to_string()).collect();
    let stab_names: Vec<String> = stab_metrics.iter().map(|m| m.name().to_string()).collect();

    let mut handler = DataHandler::new(
        &dataset_names,
        &method_names,
        features,
        &reg_names,
        &stab_names,
        n_runs,
    );
    for dataset in datasets {
        handler.register_meta(dataset)?;
    }

    let mut rng = match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for run in 0..n_runs {
        let seed: u64 = rng.gen_range(0..1_000_000);
        log::info!("Benchmark run {}/{} (seed {})", run + 1, n_runs, seed);

        for dataset in datasets {
            let (train_x, test_x, train_y, test_y) =
                train_test_split(&dataset.x, &dataset.y, dataset.train_size, seed)?;

            for method in methods.iter_mut() {
                for &descriptor in features {
                    method.configure(descriptor)?;
                    method.reseed(seed);

                    let start = Instant::now();
                    method.fit(&train_x, &train_y)?;
                    let elapsed = start.elapsed().as_secs_f64();

                    let support = method.get_support(true)?.indices();

                    let mut model = test_model.fresh();
                    model.fit(&train_x.select(Axis(1), &support), &train_y)?;
                    let prediction = model.predict(&test_x.select(Axis(1), &support))?;

                    let name = method.name().to_string();
                    for metric in reg_metrics {
                        handler.register_regression(
                            &name,
                            &dataset.name,
                            descriptor,
                            metric.name,
                            run,
                            metric.evaluate(&test_y, &prediction),
                        )?;
                    }
                    log::debug!(
                        "{} on {} with {} features took {:.3}s",
                        name,
                        dataset.name,
                        descriptor,
                        elapsed
                    );
                    handler.register_measurement(&name, &dataset.name, descriptor, run, elapsed)?;
                    handler.register_selection(&name, &dataset.name, descriptor, run, support)?;
                }
            }
        }
    }

    for score in stab_metrics {
        score.evaluate(&mut handler)?;
    }

    Ok(handler)
}

fn unique_names(level: &str, names: impl Iterator<Item = String>) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut unique = Vec::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(AuswahlError::InvalidConfig(format!(
                "{} name {} is used more than once",
                level, name
            )));
        }
        unique.push(name);
    }
    Ok(unique)
}
