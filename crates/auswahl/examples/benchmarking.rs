use std::env;

use anyhow::Context;
use auswahl::benchmarking::{benchmark, Dataset, DengScore, ResultQuery, StabilityScore, ZucknickScore};
use auswahl::config::VissaConfig;
use auswahl::feature_selection::{FeatureDescriptor, FeatureSelector, SelectKBest, Vissa};
use auswahl::io::read_spectra_csv;
use auswahl::metrics::RegressionMetric;
use auswahl::models::pls::PlsRegression;
use auswahl::report::plots;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Benchmark VISSA against the univariate F-test.
///
/// Usage: `cargo run --example benchmarking [spectra.csv target_column]`.
/// Without arguments a synthetic dataset is used.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let dataset = if args.len() >= 3 {
        read_spectra_csv(&args[1], &args[2], 0.9)?
    } else {
        let mut rng = StdRng::seed_from_u64(11);
        let x = Array2::from_shape_simple_fn((120, 40), || StandardNormal.sample(&mut rng));
        let y = x.column(3).mapv(|v| 4.0 * v) - x.column(20).mapv(|v| 2.0 * v) + &x.column(21);
        Dataset::new("synthetic", x, y, 0.9)
    };
    let name = dataset.name.clone();

    let config = VissaConfig {
        n_submodels: 500,
        n_jobs: 4,
        ..Default::default()
    };
    let mut methods: Vec<Box<dyn FeatureSelector>> = vec![
        Box::new(Vissa::new(None, config)?),
        Box::new(SelectKBest::new(None)),
    ];
    let stab_metrics: Vec<Box<dyn StabilityScore>> = vec![
        Box::new(DengScore::new()),
        Box::new(ZucknickScore::new(0.8)?),
    ];

    let handler = benchmark(
        &[dataset],
        &[FeatureDescriptor::Point(3), FeatureDescriptor::Point(10)],
        3,
        &[RegressionMetric::mean_squared_error(), RegressionMetric::mean_absolute_error()],
        &stab_metrics,
        &mut methods,
        &PlsRegression::default(),
        Some(11111111),
    )?;

    for entry in handler.get_selection_data(&ResultQuery::all().run(2))? {
        println!("{} / {} features: {:?}", entry.method, entry.features, entry.value);
    }
    for summary in handler.regression_summary(&ResultQuery::all().metric("mean_squared_error"))? {
        println!(
            "{} / {} features: MSE median {:.4} (min {:.4}, max {:.4})",
            summary.method, summary.features, summary.median, summary.min, summary.max
        );
    }

    handler
        .store("benchmark.json")
        .context("Failed to store benchmark results")?;
    plots::plot_performance_series(&handler, &name, "mean_squared_error", None)?
        .write_html("performance.html");
    plots::plot_stability_series(&handler, &name, "deng_score", None)?.write_html("stability.html");
    plots::plot_selection(&handler, &name, FeatureDescriptor::Point(10), None)?.write_html("selection.html");
    plots::plot_score_vs_stability(
        &handler,
        &name,
        FeatureDescriptor::Point(10),
        "deng_score",
        "mean_absolute_error",
        None,
    )?
    .write_html("score_vs_stability.html");

    Ok(())
}
