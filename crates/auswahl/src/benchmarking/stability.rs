//! Selection stability scores.
//!
//! A stability score compares the wavelengths selected in different runs of
//! the same method on the same dataset and feature configuration. The scores
//! here are pairwise: a similarity is computed for every pair of runs and the
//! mean over all pairs is registered in the [`DataHandler`].
use std::collections::BTreeSet;

use ndarray::Array2;

use crate::benchmarking::data_handling::{DataHandler, ResultQuery};
use crate::error::{AuswahlError, Result};

pub trait StabilityScore {
    /// Name under which the score is registered.
    fn name(&self) -> &str;

    /// Similarity of two selections (ascending indices) made on `dataset`.
    fn pairwise_similarity(
        &self,
        handler: &DataHandler,
        set_1: &[usize],
        set_2: &[usize],
        dataset: &str,
    ) -> Result<f64>;

    /// Score every (method, dataset, feature configuration) of the handler.
    /// With fewer than two runs the score is NaN.
    fn evaluate(&self, handler: &mut DataHandler) -> Result<()> {
        let mut scores = Vec::new();
        for &features in handler.feature_descriptors() {
            for method in handler.methods() {
                for dataset in handler.datasets() {
                    let query = ResultQuery::all()
                        .method(method.as_str())
                        .dataset(dataset.as_str())
                        .features(features);
                    let selections: Vec<Vec<usize>> = handler
                        .get_selection_data(&query)?
                        .into_iter()
                        .map(|entry| entry.value)
                        .collect();

                    let mut similarities = Vec::new();
                    for i in 0..selections.len() {
                        for j in (i + 1)..selections.len() {
                            similarities.push(self.pairwise_similarity(
                                handler,
                                &selections[i],
                                &selections[j],
                                dataset,
                            )?);
                        }
                    }
                    let score = if similarities.is_empty() {
                        f64::NAN
                    } else {
                        similarities.iter().sum::<f64>() / similarities.len() as f64
                    };
                    log::debug!(
                        "{} of {} on {} with {} features: {:.4}",
                        self.name(),
                        method,
                        dataset,
                        features,
                        score
                    );
                    scores.push((method.clone(), dataset.clone(), features, score));
                }
            }
        }

        for (method, dataset, features, score) in scores {
            handler.register_stability(&method, &dataset, features, self.name(), score)?;
        }
        Ok(())
    }
}

fn intersection_size(set_1: &[usize], set_2: &[usize]) -> usize {
    let set_2: BTreeSet<usize> = set_2.iter().copied().collect();
    set_1.iter().filter(|i| set_2.contains(i)).count()
}

/// Stability score for randomized selection methods by Deng et al., Analyst
/// 2015: the overlap of two selections corrected for the overlap expected by
/// chance, `(|A ∩ B| - n²/p) / (n - n²/p)`.
#[derive(Debug, Clone)]
pub struct DengScore {
    metric_name: String,
}

impl DengScore {
    pub fn new() -> Self {
        Self::with_name("deng_score")
    }

    pub fn with_name(metric_name: impl Into<String>) -> Self {
        DengScore {
            metric_name: metric_name.into(),
        }
    }
}

impl Default for DengScore {
    fn default() -> Self {
        Self::new()
    }
}

impl StabilityScore for DengScore {
    fn name(&self) -> &str {
        &self.metric_name
    }

    fn pairwise_similarity(
        &self,
        handler: &DataHandler,
        set_1: &[usize],
        set_2: &[usize],
        dataset: &str,
    ) -> Result<f64> {
        let p = handler.get_meta(dataset)?.n_wavelengths() as f64;
        let n = set_1.len() as f64;
        let expected = n * n / p;
        Ok((intersection_size(set_1, set_2) as f64 - expected) / (n - expected))
    }
}

/// Correlation-adjusted stability score by Zucknick et al., Stat. Appl. Genet.
/// Mol. Biol. 2008.
///
/// Wavelengths selected in only one of the runs still count towards stability
/// in proportion to their absolute correlation with the other selection, once
/// that correlation reaches `correlation_threshold`.
#[derive(Debug, Clone)]
pub struct ZucknickScore {
    correlation_threshold: f64,
    metric_name: String,
}

impl ZucknickScore {
    pub fn new(correlation_threshold: f64) -> Result<Self> {
        Self::with_name(correlation_threshold, "zucknick_score")
    }

    pub fn with_name(correlation_threshold: f64, metric_name: impl Into<String>) -> Result<Self> {
        if !(0.0..=1.0).contains(&correlation_threshold) {
            return Err(AuswahlError::InvalidConfig(format!(
                "correlation_threshold is required to be in [0, 1], got {}",
                correlation_threshold
            )));
        }
        Ok(ZucknickScore {
            correlation_threshold,
            metric_name: metric_name.into(),
        })
    }

    pub fn correlation_threshold(&self) -> f64 {
        self.correlation_threshold
    }

    /// Thresholded absolute correlations between `support_1` and the
    /// wavelengths only in `support_2`, normalized by `|support_2|`.
    fn thresholded_correlation(&self, spectra: &Array2<f64>, support_1: &[usize], support_2: &[usize]) -> f64 {
        let in_first: BTreeSet<usize> = support_1.iter().copied().collect();
        let difference: Vec<usize> = support_2
            .iter()
            .copied()
            .filter(|i| !in_first.contains(i))
            .collect();
        if difference.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for &a in support_1 {
            for &b in &difference {
                let r = pearson(spectra, a, b).abs();
                if r >= self.correlation_threshold {
                    total += r;
                }
            }
        }
        total / support_2.len() as f64
    }
}

impl Default for ZucknickScore {
    fn default() -> Self {
        ZucknickScore {
            correlation_threshold: 0.8,
            metric_name: "zucknick_score".to_string(),
        }
    }
}

/// Pearson correlation of two columns; 0 when either column is constant.
fn pearson(x: &Array2<f64>, a: usize, b: usize) -> f64 {
    let col_a = x.column(a);
    let col_b = x.column(b);
    let n = col_a.len() as f64;
    let mean_a = col_a.sum() / n;
    let mean_b = col_b.sum() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&va, &vb) in col_a.iter().zip(col_b.iter()) {
        let (da, db) = (va - mean_a, vb - mean_b);
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let r = cov / (var_a * var_b).sqrt();
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

impl StabilityScore for ZucknickScore {
    fn name(&self) -> &str {
        &self.metric_name
    }

    fn pairwise_similarity(
        &self,
        handler: &DataHandler,
        set_1: &[usize],
        set_2: &[usize],
        dataset: &str,
    ) -> Result<f64> {
        let spectra = &handler.get_meta(dataset)?.x;
        let intersection = intersection_size(set_1, set_2);
        let union = set_1.len() + set_2.len() - intersection;
        let c_12 = self.thresholded_correlation(spectra, set_1, set_2);
        let c_21 = self.thresholded_correlation(spectra, set_2, set_1);
        Ok((intersection as f64 + c_12 + c_21) / union as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pearson_of_constant_column_is_zero() {
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 1.0, 3.0, 1.0, 4.0]).unwrap();
        assert_eq!(pearson(&x, 0, 1), 0.0);
        assert_abs_diff_eq!(pearson(&x, 1, 1), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_intersection_size() {
        assert_eq!(intersection_size(&[0, 3, 5], &[5, 6, 0]), 2);
        assert_eq!(intersection_size(&[], &[1]), 0);
    }

    #[test]
    fn test_zucknick_threshold_is_validated() {
        assert!(ZucknickScore::new(1.2).is_err());
        assert!(ZucknickScore::new(-0.1).is_err());
        assert_eq!(ZucknickScore::new(0.0).unwrap().correlation_threshold(), 0.0);
    }
}
