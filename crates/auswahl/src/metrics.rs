//! Regression metrics used to assess selections on held-out data.
use ndarray::Array1;

/// Signature shared by all regression metrics: `(y_true, y_pred) -> value`.
pub type MetricFn = fn(&Array1<f64>, &Array1<f64>) -> f64;

/// A regression metric together with the name it is registered under.
#[derive(Clone, Copy)]
pub struct RegressionMetric {
    pub name: &'static str,
    pub func: MetricFn,
}

impl RegressionMetric {
    pub fn new(name: &'static str, func: MetricFn) -> Self {
        RegressionMetric { name, func }
    }

    pub fn mean_squared_error() -> Self {
        RegressionMetric::new("mean_squared_error", mean_squared_error)
    }

    pub fn mean_absolute_error() -> Self {
        RegressionMetric::new("mean_absolute_error", mean_absolute_error)
    }

    pub fn r2_score() -> Self {
        RegressionMetric::new("r2_score", r2_score)
    }

    pub fn evaluate(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        (self.func)(y_true, y_pred)
    }
}

impl std::fmt::Debug for RegressionMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegressionMetric")
            .field("name", &self.name)
            .finish()
    }
}

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "y_true and y_pred must have equal lengths");
    let diff = y_true - y_pred;
    diff.dot(&diff) / y_true.len() as f64
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "y_true and y_pred must have equal lengths");
    (y_true - y_pred).mapv(f64::abs).sum() / y_true.len() as f64
}

/// Coefficient of determination. A constant `y_true` scores 1.0 for a perfect
/// prediction and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "y_true and y_pred must have equal lengths");
    let mean = y_true.sum() / y_true.len() as f64;
    let ss_res: f64 = (y_true - y_pred).mapv(|v| v * v).sum();
    let ss_tot: f64 = y_true.mapv(|v| (v - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
