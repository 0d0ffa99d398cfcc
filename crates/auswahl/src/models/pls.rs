//! Partial least squares regression backed by `linfa-pls`.
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_pls::{PlsError, PlsRegression as LinfaPls};
use ndarray::{Array1, Array2, Axis};

use crate::error::{AuswahlError, Result};
use crate::models::regressor_trait::RegressionModel;

enum FittedPls {
    Latent(LinfaPls<f64>),
    /// The response carries no signal the inputs can explain.
    Constant(f64),
}

/// PLS regression with `n_components` latent variables and a single response.
pub struct PlsRegression {
    n_components: usize,
    scale: bool,
    fitted: Option<(FittedPls, usize)>,
}

impl PlsRegression {
    pub fn new(n_components: usize, scale: bool) -> Self {
        PlsRegression {
            n_components,
            scale,
            fitted: None,
        }
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }
}

impl Default for PlsRegression {
    fn default() -> Self {
        PlsRegression::new(2, true)
    }
}

impl RegressionModel for PlsRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.fitted = None;
        let (n_samples, n_features) = x.dim();
        if n_samples != y.len() {
            return Err(AuswahlError::Fit(format!(
                "x has {} samples but y has {}",
                n_samples,
                y.len()
            )));
        }
        if n_samples < 2 {
            return Err(AuswahlError::Fit(format!(
                "PLS needs at least 2 samples, got {}",
                n_samples
            )));
        }
        if n_features == 0 {
            return Err(AuswahlError::Fit(
                "PLS needs at least one feature".to_string(),
            ));
        }

        let max_components = n_features.min(n_samples - 1);
        let mut n_components = if self.n_components > max_components {
            log::warn!(
                "Requested {} PLS components but only {} are supported by data of shape ({}, {}); using {}",
                self.n_components,
                max_components,
                n_samples,
                n_features,
                max_components
            );
            max_components
        } else {
            self.n_components
        };

        let dataset = DatasetBase::new(x.to_owned(), y.to_owned().insert_axis(Axis(1)));

        // linfa stops with an error once the response residual is exhausted,
        // so retry with fewer components until the residual carries signal.
        let fitted = loop {
            let result: std::result::Result<LinfaPls<f64>, PlsError> =
                LinfaPls::<f64>::params(n_components).scale(self.scale).fit(&dataset);
            match result {
                Ok(model) => break FittedPls::Latent(model),
                Err(PlsError::PowerMethodConstantResidualError { .. }) if n_components > 1 => {
                    log::debug!(
                        "PLS residual exhausted with {} components, retrying with {}",
                        n_components,
                        n_components - 1
                    );
                    n_components -= 1;
                }
                Err(PlsError::PowerMethodConstantResidualError { .. }) => {
                    break FittedPls::Constant(y.sum() / n_samples as f64);
                }
                Err(e) => return Err(AuswahlError::Fit(format!("PLS fit failed: {}", e))),
            }
        };

        self.fitted = Some((fitted, n_features));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (fitted, n_features) = self.fitted.as_ref().ok_or(AuswahlError::NotFitted)?;
        if x.ncols() != *n_features {
            return Err(AuswahlError::Fit(format!(
                "model was fitted on {} features but x has {}",
                n_features,
                x.ncols()
            )));
        }
        match fitted {
            FittedPls::Latent(model) => {
                let prediction: Array2<f64> = model.predict(x);
                Ok(prediction.column(0).to_owned())
            }
            FittedPls::Constant(mean) => Ok(Array1::from_elem(x.nrows(), *mean)),
        }
    }

    fn fresh(&self) -> Box<dyn RegressionModel> {
        Box::new(PlsRegression::new(self.n_components, self.scale))
    }

    fn name(&self) -> &str {
        "PLSRegression"
    }
}
