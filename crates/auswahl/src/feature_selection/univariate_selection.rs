//! Univariate feature scoring following scikit-learn's `f_regression`.
//!
//! See: https://scikit-learn.org/stable/modules/feature_selection.html#univariate-feature-selection

use ndarray::{Array1, Array2, Axis};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::error::{AuswahlError, Result};
use crate::feature_selection::selector::{
    resolve_n_features, top_k_mask, FeatureDescriptor, FeatureSelector,
};

/// Pearson's r between every column of `x` and `y`.
///
/// # Parameters
///
/// * `x` - Spectra of shape (n_samples, n_features).
/// * `y` - Targets of shape (n_samples,).
/// * `center` - Subtract the means of `x` and `y` before correlating.
/// * `force_finite` - Replace non-finite coefficients (e.g. constant
///   wavelengths) with 0.
pub fn r_regression(x: &Array2<f64>, y: &Array1<f64>, center: bool, force_finite: bool) -> Result<Array1<f64>> {
    if x.nrows() != y.len() || y.is_empty() {
        return Err(AuswahlError::InvalidConfig(format!(
            "cannot correlate {} samples with {} targets",
            x.nrows(),
            y.len()
        )));
    }

    let (x_centered, y_centered) = if center {
        let x_mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            AuswahlError::InvalidConfig("cannot center an empty matrix".to_string())
        })?;
        let y_mean = y.sum() / y.len() as f64;
        (x - &x_mean, y.mapv(|v| v - y_mean))
    } else {
        (x.to_owned(), y.to_owned())
    };

    let x_norms = x_centered.map_axis(Axis(0), |col| col.dot(&col).sqrt());
    let y_norm = y_centered.dot(&y_centered).sqrt();

    let mut r = x_centered.t().dot(&y_centered) / &x_norms / y_norm;
    if force_finite {
        r.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });
    }
    Ok(r)
}

/// Univariate linear regression tests returning F-statistics and p-values.
///
/// With `force_finite`, infinite statistics (perfectly correlated features)
/// become `f64::MAX` with p-value 0, and NaN statistics become 0 with p-value 1.
pub fn f_regression(
    x: &Array2<f64>,
    y: &Array1<f64>,
    center: bool,
    force_finite: bool,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let r = r_regression(x, y, center, force_finite)?;
    let dof = y.len() as f64 - if center { 2.0 } else { 1.0 };
    if dof <= 0.0 {
        return Err(AuswahlError::InvalidConfig(format!(
            "F-test needs more samples, got {}",
            y.len()
        )));
    }

    let r2 = r.mapv(|v| v * v);
    let mut f_statistic = r2.mapv(|v| v / (1.0 - v) * dof);

    let f_dist = FisherSnedecor::new(1.0, dof)
        .map_err(|e| AuswahlError::InvalidConfig(format!("invalid F distribution: {}", e)))?;
    let mut p_values = f_statistic.mapv(|f| if f.is_finite() { f_dist.sf(f) } else { f64::NAN });

    if force_finite {
        for (f, p) in f_statistic.iter_mut().zip(p_values.iter_mut()) {
            if f.is_infinite() {
                *f = f64::MAX;
                *p = 0.0;
            } else if f.is_nan() {
                *f = 0.0;
                *p = 1.0;
            }
        }
    }

    Ok((f_statistic, p_values))
}

/// Select the `k` wavelengths with the highest F-statistic.
pub struct SelectKBest {
    k: Option<usize>,
    scores: Option<Array1<f64>>,
    p_values: Option<Array1<f64>>,
    support: Option<Array1<bool>>,
}

impl SelectKBest {
    /// `k` defaults to half of the features when `None`.
    pub fn new(k: Option<usize>) -> Self {
        SelectKBest {
            k,
            scores: None,
            p_values: None,
            support: None,
        }
    }

    pub fn scores(&self) -> Result<&Array1<f64>> {
        self.scores.as_ref().ok_or(AuswahlError::NotFitted)
    }

    pub fn p_values(&self) -> Result<&Array1<f64>> {
        self.p_values.as_ref().ok_or(AuswahlError::NotFitted)
    }
}

impl FeatureSelector for SelectKBest {
    fn name(&self) -> &str {
        "SelectKBest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let k = resolve_n_features(self.k, x.ncols())?;
        let (scores, p_values) = f_regression(x, y, true, true)?;
        log::debug!("F-test scored {} wavelengths, keeping {}", scores.len(), k);

        self.support = Some(top_k_mask(&scores, k));
        self.scores = Some(scores);
        self.p_values = Some(p_values);
        Ok(())
    }

    fn support_mask(&self) -> Result<&Array1<bool>> {
        self.support.as_ref().ok_or(AuswahlError::NotFitted)
    }

    fn configure(&mut self, features: FeatureDescriptor) -> Result<()> {
        self.k = Some(features.n_features());
        Ok(())
    }
}
