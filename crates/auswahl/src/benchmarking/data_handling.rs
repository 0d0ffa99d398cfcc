//! Results store for benchmarking runs.
//!
//! `DataHandler` corrals everything a benchmark produces: regression metrics
//! per run, the selected wavelengths per run, stability scores per feature
//! configuration and fit times. Records are keyed by method, dataset and
//! [`FeatureDescriptor`], plus a metric name and/or run index. The set of
//! valid items of every level is fixed at construction.
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::error::{AuswahlError, Result};
use crate::feature_selection::selector::FeatureDescriptor;

/// A named spectral dataset ready for benchmarking.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    /// Fraction of samples used for fitting the selectors.
    pub train_size: f64,
}

impl Dataset {
    pub fn new(name: impl Into<String>, x: Array2<f64>, y: Array1<f64>, train_size: f64) -> Self {
        Dataset {
            name: name.into(),
            x,
            y,
            train_size,
        }
    }

    pub fn n_wavelengths(&self) -> usize {
        self.x.ncols()
    }
}

/// Spectra and targets of a registered dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

impl DatasetMeta {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_wavelengths(&self) -> usize {
        self.x.ncols()
    }
}

/// Either every item of a level or an explicit list.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyFilter<T> {
    All,
    Only(Vec<T>),
}

impl<T> Default for KeyFilter<T> {
    fn default() -> Self {
        KeyFilter::All
    }
}

impl<T: PartialEq> KeyFilter<T> {
    fn admits(&self, item: &T) -> bool {
        match self {
            KeyFilter::All => true,
            KeyFilter::Only(items) => items.contains(item),
        }
    }
}

/// Selection of records across the levels of the store.
///
/// ```
/// use auswahl::benchmarking::ResultQuery;
///
/// let query = ResultQuery::all().method("VISSA").dataset("corn").run(0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResultQuery {
    pub method: KeyFilter<String>,
    pub dataset: KeyFilter<String>,
    pub features: KeyFilter<FeatureDescriptor>,
    pub metric: KeyFilter<String>,
    pub run: KeyFilter<usize>,
}

fn push<T>(filter: &mut KeyFilter<T>, item: T) {
    match filter {
        KeyFilter::All => *filter = KeyFilter::Only(vec![item]),
        KeyFilter::Only(items) => items.push(item),
    }
}

impl ResultQuery {
    /// Query matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        push(&mut self.method, method.into());
        self
    }

    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        push(&mut self.dataset, dataset.into());
        self
    }

    pub fn features(mut self, features: impl Into<FeatureDescriptor>) -> Self {
        push(&mut self.features, features.into());
        self
    }

    /// Regression or stability metric name.
    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        push(&mut self.metric, metric.into());
        self
    }

    pub fn run(mut self, run: usize) -> Self {
        push(&mut self.run, run);
        self
    }
}

/// One record returned by a query. `metric` and `run` are set for the
/// record kinds that are keyed by them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry<V> {
    pub method: String,
    pub dataset: String,
    pub features: FeatureDescriptor,
    pub metric: Option<String>,
    pub run: Option<usize>,
    pub value: V,
}

/// Statistics of one regression metric over all runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionSummary {
    pub method: String,
    pub dataset: String,
    pub features: FeatureDescriptor,
    pub metric: String,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

type RunKey = (String, String, FeatureDescriptor, usize);
type MetricRunKey = (String, String, FeatureDescriptor, String, usize);
type MetricKey = (String, String, FeatureDescriptor, String);

/// Maps with tuple keys are written as sequences of `(key, value)` pairs.
mod entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
    {
        let pairs: Vec<(K, V)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataHandler {
    datasets: Vec<String>,
    methods: Vec<String>,
    features: Vec<FeatureDescriptor>,
    reg_metrics: Vec<String>,
    stab_metrics: Vec<String>,
    n_runs: usize,
    #[serde(with = "entries")]
    regression: BTreeMap<MetricRunKey, f64>,
    #[serde(with = "entries")]
    selection: BTreeMap<RunKey, Vec<usize>>,
    #[serde(with = "entries")]
    stability: BTreeMap<MetricKey, f64>,
    #[serde(with = "entries")]
    measurement: BTreeMap<RunKey, f64>,
    meta: BTreeMap<String, DatasetMeta>,
}

fn sorted_unique<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    items.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

fn check_level<T: PartialEq + ToString>(level: &str, known: &[T], item: &T) -> Result<()> {
    if known.contains(item) {
        Ok(())
    } else {
        Err(AuswahlError::key_not_found(item.to_string(), level))
    }
}

fn check_filter<T: PartialEq + ToString>(level: &str, known: &[T], filter: &KeyFilter<T>) -> Result<()> {
    if let KeyFilter::Only(items) = filter {
        for item in items {
            check_level(level, known, item)?;
        }
    }
    Ok(())
}

impl DataHandler {
    pub fn new(
        datasets: &[String],
        methods: &[String],
        features: &[FeatureDescriptor],
        reg_metrics: &[String],
        stab_metrics: &[String],
        n_runs: usize,
    ) -> Self {
        DataHandler {
            datasets: sorted_unique(datasets),
            methods: sorted_unique(methods),
            features: sorted_unique(features),
            reg_metrics: sorted_unique(reg_metrics),
            stab_metrics: sorted_unique(stab_metrics),
            n_runs,
            regression: BTreeMap::new(),
            selection: BTreeMap::new(),
            stability: BTreeMap::new(),
            measurement: BTreeMap::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn feature_descriptors(&self) -> &[FeatureDescriptor] {
        &self.features
    }

    pub fn reg_metrics(&self) -> &[String] {
        &self.reg_metrics
    }

    pub fn stab_metrics(&self) -> &[String] {
        &self.stab_metrics
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Keep the spectra and targets of `dataset` for stability scores that
    /// need them.
    pub fn register_meta(&mut self, dataset: &Dataset) -> Result<()> {
        check_level("dataset", &self.datasets, &dataset.name)?;
        self.meta.insert(
            dataset.name.clone(),
            DatasetMeta {
                x: dataset.x.clone(),
                y: dataset.y.clone(),
            },
        );
        Ok(())
    }

    pub fn get_meta(&self, dataset: &str) -> Result<&DatasetMeta> {
        self.meta
            .get(dataset)
            .ok_or_else(|| AuswahlError::key_not_found(dataset, "dataset"))
    }

    fn check_key(&self, method: &str, dataset: &str, features: FeatureDescriptor) -> Result<()> {
        check_level("method", &self.methods, &method.to_string())?;
        check_level("dataset", &self.datasets, &dataset.to_string())?;
        check_level("n_features", &self.features, &features)
    }

    fn check_run(&self, run: usize) -> Result<()> {
        if run < self.n_runs {
            Ok(())
        } else {
            Err(AuswahlError::key_not_found(run, "run"))
        }
    }

    pub fn register_regression(
        &mut self,
        method: &str,
        dataset: &str,
        features: FeatureDescriptor,
        metric: &str,
        run: usize,
        value: f64,
    ) -> Result<()> {
        self.check_key(method, dataset, features)?;
        check_level("regression_metric", &self.reg_metrics, &metric.to_string())?;
        self.check_run(run)?;
        self.regression.insert(
            (method.to_string(), dataset.to_string(), features, metric.to_string(), run),
            value,
        );
        Ok(())
    }

    /// Record the indices of the wavelengths selected in one run.
    pub fn register_selection(
        &mut self,
        method: &str,
        dataset: &str,
        features: FeatureDescriptor,
        run: usize,
        selection: Vec<usize>,
    ) -> Result<()> {
        self.check_key(method, dataset, features)?;
        self.check_run(run)?;
        self.selection
            .insert((method.to_string(), dataset.to_string(), features, run), selection);
        Ok(())
    }

    pub fn register_stability(
        &mut self,
        method: &str,
        dataset: &str,
        features: FeatureDescriptor,
        metric: &str,
        value: f64,
    ) -> Result<()> {
        self.check_key(method, dataset, features)?;
        check_level("stability_metric", &self.stab_metrics, &metric.to_string())?;
        self.stability.insert(
            (method.to_string(), dataset.to_string(), features, metric.to_string()),
            value,
        );
        Ok(())
    }

    /// Record the fit time of one run in seconds.
    pub fn register_measurement(
        &mut self,
        method: &str,
        dataset: &str,
        features: FeatureDescriptor,
        run: usize,
        seconds: f64,
    ) -> Result<()> {
        self.check_key(method, dataset, features)?;
        self.check_run(run)?;
        self.measurement
            .insert((method.to_string(), dataset.to_string(), features, run), seconds);
        Ok(())
    }

    fn check_query(&self, query: &ResultQuery, metrics: Option<(&str, &[String])>) -> Result<()> {
        check_filter("method", &self.methods, &query.method)?;
        check_filter("dataset", &self.datasets, &query.dataset)?;
        check_filter("n_features", &self.features, &query.features)?;
        if let Some((level, known)) = metrics {
            check_filter(level, known, &query.metric)?;
        }
        if let KeyFilter::Only(runs) = &query.run {
            for &run in runs {
                self.check_run(run)?;
            }
        }
        Ok(())
    }

    fn admits(query: &ResultQuery, method: &str, dataset: &str, features: &FeatureDescriptor) -> bool {
        query.method.admits(&method.to_string())
            && query.dataset.admits(&dataset.to_string())
            && query.features.admits(features)
    }

    /// Regression metric values per run. The metric level names regression
    /// metrics.
    pub fn get_regression_data(&self, query: &ResultQuery) -> Result<Vec<Entry<f64>>> {
        self.check_query(query, Some(("regression_metric", &self.reg_metrics)))?;
        Ok(self
            .regression
            .iter()
            .filter(|((m, d, f, metric, run), _)| {
                Self::admits(query, m, d, f) && query.metric.admits(metric) && query.run.admits(run)
            })
            .map(|((m, d, f, metric, run), &value)| Entry {
                method: m.clone(),
                dataset: d.clone(),
                features: *f,
                metric: Some(metric.clone()),
                run: Some(*run),
                value,
            })
            .collect())
    }

    /// Selected wavelength indices per run.
    pub fn get_selection_data(&self, query: &ResultQuery) -> Result<Vec<Entry<Vec<usize>>>> {
        self.check_query(query, None)?;
        Ok(self
            .selection
            .iter()
            .filter(|((m, d, f, run), _)| Self::admits(query, m, d, f) && query.run.admits(run))
            .map(|((m, d, f, run), value)| Entry {
                method: m.clone(),
                dataset: d.clone(),
                features: *f,
                metric: None,
                run: Some(*run),
                value: value.clone(),
            })
            .collect())
    }

    /// Stability scores. The metric level names stability metrics.
    pub fn get_stability_data(&self, query: &ResultQuery) -> Result<Vec<Entry<f64>>> {
        self.check_query(query, Some(("stability_metric", &self.stab_metrics)))?;
        Ok(self
            .stability
            .iter()
            .filter(|((m, d, f, metric), _)| Self::admits(query, m, d, f) && query.metric.admits(metric))
            .map(|((m, d, f, metric), &value)| Entry {
                method: m.clone(),
                dataset: d.clone(),
                features: *f,
                metric: Some(metric.clone()),
                run: None,
                value,
            })
            .collect())
    }

    /// Fit times in seconds per run.
    pub fn get_measurement_data(&self, query: &ResultQuery) -> Result<Vec<Entry<f64>>> {
        self.check_query(query, None)?;
        Ok(self
            .measurement
            .iter()
            .filter(|((m, d, f, run), _)| Self::admits(query, m, d, f) && query.run.admits(run))
            .map(|((m, d, f, run), &value)| Entry {
                method: m.clone(),
                dataset: d.clone(),
                features: *f,
                metric: None,
                run: Some(*run),
                value,
            })
            .collect())
    }

    /// Mean, sample standard deviation, median, minimum and maximum of every
    /// regression metric over the runs admitted by `query`.
    pub fn regression_summary(&self, query: &ResultQuery) -> Result<Vec<RegressionSummary>> {
        let mut grouped: BTreeMap<MetricKey, Vec<f64>> = BTreeMap::new();
        for entry in self.get_regression_data(query)? {
            let metric = entry.metric.unwrap_or_default();
            grouped
                .entry((entry.method, entry.dataset, entry.features, metric))
                .or_default()
                .push(entry.value);
        }

        Ok(grouped
            .into_iter()
            .map(|((method, dataset, features, metric), values)| RegressionSummary {
                method,
                dataset,
                features,
                metric,
                mean: Statistics::mean(&values),
                std: Statistics::std_dev(&values),
                median: Data::new(values.clone()).median(),
                min: Statistics::min(&values),
                max: Statistics::max(&values),
            })
            .collect())
    }

    /// Write the handler as JSON.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer(writer, self)?;
        log::info!("Stored benchmarking results in {}", path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn handler() -> DataHandler {
        DataHandler::new(
            &names(&["corn", "soil"]),
            &names(&["VISSA", "SelectKBest"]),
            &[FeatureDescriptor::Point(10), FeatureDescriptor::Point(5)],
            &names(&["mean_squared_error"]),
            &names(&["deng_score"]),
            3,
        )
    }

    #[test]
    fn test_levels_are_sorted() {
        let handler = handler();
        assert_eq!(handler.methods(), &names(&["SelectKBest", "VISSA"])[..]);
        assert_eq!(
            handler.feature_descriptors(),
            &[FeatureDescriptor::Point(5), FeatureDescriptor::Point(10)]
        );
    }

    #[test]
    fn test_register_rejects_unknown_items() {
        let mut handler = handler();
        let err = handler
            .register_regression("CARS", "corn", FeatureDescriptor::Point(10), "mean_squared_error", 0, 1.0)
            .unwrap_err();
        assert_eq!(err.to_string(), "Item CARS not present in level method");

        let err = handler
            .register_selection("VISSA", "corn", FeatureDescriptor::Point(10), 3, vec![1])
            .unwrap_err();
        assert_eq!(err.to_string(), "Item 3 not present in level run");

        let err = handler
            .register_measurement("VISSA", "corn", FeatureDescriptor::Point(7), 0, 0.5)
            .unwrap_err();
        assert_eq!(err.to_string(), "Item 7 not present in level n_features");
    }

    #[test]
    fn test_query_rejects_unknown_filter_items() {
        let handler = handler();
        let query = ResultQuery::all().features(FeatureDescriptor::Interval {
            n_intervals: 2,
            width: 3,
        });
        let err = handler.get_selection_data(&query).unwrap_err();
        assert_eq!(err.to_string(), "Item (2, 3) not present in level n_features");
    }

    #[test]
    fn test_summary_over_runs() {
        let mut handler = handler();
        for (run, value) in [1.0, 2.0, 6.0].into_iter().enumerate() {
            handler
                .register_regression("VISSA", "corn", FeatureDescriptor::Point(10), "mean_squared_error", run, value)
                .unwrap();
        }
        let summary = handler.regression_summary(&ResultQuery::all()).unwrap();
        assert_eq!(summary.len(), 1);
        let s = &summary[0];
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 2.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 6.0);
        assert!((s.std - 7.0f64.sqrt()).abs() < 1e-12);
    }
}
