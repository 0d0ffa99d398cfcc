use ndarray::{Array1, Array2};

use crate::error::Result;

/// Contract for regression estimators used to score feature subsets.
///
/// Implementations must be `Send + Sync` so that fresh copies can be fitted
/// concurrently by the submodel evaluator.
pub trait RegressionModel: Send + Sync {
    /// Fit the model on `x` (n_samples, n_features) and the response `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict the response for every row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// A fresh, unfitted copy carrying the same hyper-parameters.
    fn fresh(&self) -> Box<dyn RegressionModel>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "regressor"
    }
}
