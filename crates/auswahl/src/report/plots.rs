//! Plotly figures summarizing a benchmark stored in a [`DataHandler`].
use plotly::box_plot::BoxMean;
use plotly::common::{ErrorData, ErrorType, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, BoxPlot, Plot, Scatter};

use crate::benchmarking::data_handling::{DataHandler, ResultQuery};
use crate::error::Result;

fn selected_methods(handler: &DataHandler, methods: Option<&[String]>) -> Vec<String> {
    match methods {
        Some(methods) => methods.to_vec(),
        None => handler.methods().to_vec(),
    }
}

fn layout(title: &str, x_label: &str, y_label: &str) -> Layout {
    Layout::new()
        .title(title)
        .x_axis(Axis::new().title(x_label))
        .y_axis(Axis::new().title(y_label))
}

/// Median of a regression metric per feature configuration, one trace per
/// method, with error bars spanning the minimum and maximum over the runs.
pub fn plot_performance_series(
    handler: &DataHandler,
    dataset: &str,
    reg_metric: &str,
    methods: Option<&[String]>,
) -> Result<Plot> {
    let mut plot = Plot::new();
    for method in selected_methods(handler, methods) {
        let mut labels = Vec::new();
        let mut medians = Vec::new();
        let mut above = Vec::new();
        let mut below = Vec::new();

        for &features in handler.feature_descriptors() {
            let query = ResultQuery::all()
                .method(method.as_str())
                .dataset(dataset)
                .features(features)
                .metric(reg_metric);
            if let Some(summary) = handler.regression_summary(&query)?.into_iter().next() {
                labels.push(features.to_string());
                medians.push(summary.median);
                above.push(summary.max - summary.median);
                below.push(summary.median - summary.min);
            }
        }

        let trace = Scatter::new(labels, medians)
            .mode(Mode::LinesMarkers)
            .name(&method)
            .error_y(
                ErrorData::new(ErrorType::Data)
                    .symmetric(false)
                    .array(above)
                    .array_minus(below),
            );
        plot.add_trace(trace);
    }

    plot.set_layout(layout(
        &format!("Regression performance on {}", dataset),
        "Selected features",
        reg_metric,
    ));
    Ok(plot)
}

/// Stability score per feature configuration, one trace per method.
pub fn plot_stability_series(
    handler: &DataHandler,
    dataset: &str,
    stab_metric: &str,
    methods: Option<&[String]>,
) -> Result<Plot> {
    let mut plot = Plot::new();
    for method in selected_methods(handler, methods) {
        let query = ResultQuery::all()
            .method(method.as_str())
            .dataset(dataset)
            .metric(stab_metric);
        let (labels, scores): (Vec<String>, Vec<f64>) = handler
            .get_stability_data(&query)?
            .into_iter()
            .map(|entry| (entry.features.to_string(), entry.value))
            .unzip();

        plot.add_trace(Scatter::new(labels, scores).mode(Mode::LinesMarkers).name(&method));
    }

    plot.set_layout(layout(
        &format!("Selection stability on {}", dataset),
        "Selected features",
        stab_metric,
    ));
    Ok(plot)
}

/// Distribution of fit times over the runs, one box per method.
pub fn plot_exec_time(
    handler: &DataHandler,
    dataset: &str,
    features: impl Into<crate::feature_selection::FeatureDescriptor>,
    methods: Option<&[String]>,
) -> Result<Plot> {
    let features = features.into();
    let mut plot = Plot::new();
    for method in selected_methods(handler, methods) {
        let query = ResultQuery::all()
            .method(method.as_str())
            .dataset(dataset)
            .features(features);
        let seconds: Vec<f64> = handler
            .get_measurement_data(&query)?
            .into_iter()
            .map(|entry| entry.value)
            .collect();
        plot.add_trace(BoxPlot::<f64, f64>::new(seconds).name(&method));
    }

    plot.set_layout(layout(
        &format!("Execution time on {} with {} features", dataset, features),
        "Method",
        "Seconds",
    ));
    Ok(plot)
}

/// Regression score over the runs against the stability score, one box per
/// method placed at its stability score on the x axis. The box spans the
/// quartiles of the per-run scores and marks their mean.
///
/// Methods without a registered stability score are left out.
pub fn plot_score_vs_stability(
    handler: &DataHandler,
    dataset: &str,
    features: impl Into<crate::feature_selection::FeatureDescriptor>,
    stab_metric: &str,
    reg_metric: &str,
    methods: Option<&[String]>,
) -> Result<Plot> {
    let features = features.into();
    let mut plot = Plot::new();
    for method in selected_methods(handler, methods) {
        let query = ResultQuery::all()
            .method(method.as_str())
            .dataset(dataset)
            .features(features);
        let stability = match handler
            .get_stability_data(&query.clone().metric(stab_metric))?
            .into_iter()
            .next()
        {
            Some(entry) => entry.value,
            None => continue,
        };
        let scores: Vec<f64> = handler
            .get_regression_data(&query.metric(reg_metric))?
            .into_iter()
            .map(|entry| entry.value)
            .collect();

        let positions = vec![stability; scores.len()];
        plot.add_trace(
            BoxPlot::new_xy(positions, scores)
                .name(&method)
                .box_mean(BoxMean::True),
        );
    }

    plot.set_layout(layout(
        &format!("Regression score vs. stability on {} with {} features", dataset, features),
        stab_metric,
        reg_metric,
    ));
    Ok(plot)
}

/// Fraction of runs in which each wavelength was selected.
pub fn plot_selection(
    handler: &DataHandler,
    dataset: &str,
    features: impl Into<crate::feature_selection::FeatureDescriptor>,
    methods: Option<&[String]>,
) -> Result<Plot> {
    let features = features.into();
    let n_wavelengths = handler.get_meta(dataset)?.n_wavelengths();

    let mut plot = Plot::new();
    for method in selected_methods(handler, methods) {
        let query = ResultQuery::all()
            .method(method.as_str())
            .dataset(dataset)
            .features(features);
        let selections = handler.get_selection_data(&query)?;

        let mut frequency = vec![0.0; n_wavelengths];
        for entry in &selections {
            for &wavelength in &entry.value {
                if wavelength < n_wavelengths {
                    frequency[wavelength] += 1.0;
                }
            }
        }
        if !selections.is_empty() {
            let n_runs = selections.len() as f64;
            frequency.iter_mut().for_each(|f| *f /= n_runs);
        }

        let wavelengths: Vec<usize> = (0..n_wavelengths).collect();
        plot.add_trace(Bar::new(wavelengths, frequency).name(&method));
    }

    plot.set_layout(layout(
        &format!("Selected wavelengths on {} with {} features", dataset, features),
        "Wavelength",
        "Selection frequency",
    ));
    Ok(plot)
}
