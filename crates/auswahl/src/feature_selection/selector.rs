//! Shared contract for feature selectors.
use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{AuswahlError, Result};

/// Number of features a selector is asked to keep.
///
/// Point selectors pick individual wavelengths; interval selectors pick
/// `n_intervals` contiguous bands of `width` wavelengths each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureDescriptor {
    Point(usize),
    Interval { n_intervals: usize, width: usize },
}

impl FeatureDescriptor {
    /// Total number of features covered by the descriptor.
    pub fn n_features(&self) -> usize {
        match *self {
            FeatureDescriptor::Point(n) => n,
            FeatureDescriptor::Interval { n_intervals, width } => n_intervals * width,
        }
    }
}

impl From<usize> for FeatureDescriptor {
    fn from(n: usize) -> Self {
        FeatureDescriptor::Point(n)
    }
}

impl From<(usize, usize)> for FeatureDescriptor {
    fn from((n_intervals, width): (usize, usize)) -> Self {
        FeatureDescriptor::Interval { n_intervals, width }
    }
}

impl fmt::Display for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureDescriptor::Point(n) => write!(f, "{}", n),
            FeatureDescriptor::Interval { n_intervals, width } => {
                write!(f, "({}, {})", n_intervals, width)
            }
        }
    }
}

/// Selected features, either as a boolean mask or as ascending indices.
#[derive(Debug, Clone, PartialEq)]
pub enum Support {
    Mask(Array1<bool>),
    Indices(Vec<usize>),
}

impl Support {
    pub fn from_mask(mask: &Array1<bool>, indices: bool) -> Self {
        if indices {
            Support::Indices(mask_to_indices(mask))
        } else {
            Support::Mask(mask.clone())
        }
    }

    /// Selected indices regardless of representation.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Support::Mask(mask) => mask_to_indices(mask),
            Support::Indices(indices) => indices.clone(),
        }
    }
}

pub fn mask_to_indices(mask: &Array1<bool>) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &selected)| if selected { Some(i) } else { None })
        .collect()
}

/// Mask selecting the `k` highest weights. Ties keep the lower index first.
pub fn top_k_mask(weights: &Array1<f64>, k: usize) -> Array1<bool> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));

    let mut mask = Array1::from_elem(weights.len(), false);
    for &idx in order.iter().take(k) {
        mask[idx] = true;
    }
    mask
}

/// Contract implemented by every selection method.
pub trait FeatureSelector {
    /// Name under which results are recorded.
    fn name(&self) -> &str;

    /// Fit the selector on spectra `x` (n_samples, n_features) and targets `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Boolean mask of the selected features.
    fn support_mask(&self) -> Result<&Array1<bool>>;

    /// Selected features as a mask, or as indices when `indices` is true.
    fn get_support(&self, indices: bool) -> Result<Support> {
        Ok(Support::from_mask(self.support_mask()?, indices))
    }

    /// Apply a feature configuration before the next `fit`.
    fn configure(&mut self, features: FeatureDescriptor) -> Result<()>;

    /// Reseed randomized selectors. Deterministic selectors ignore this.
    fn reseed(&mut self, _seed: u64) {}
}

/// Resolve the requested count against the data, defaulting to half of the
/// features.
pub(crate) fn resolve_n_features(requested: Option<usize>, n_features: usize) -> Result<usize> {
    let n = requested.unwrap_or(n_features / 2).max(1);
    if n > n_features {
        return Err(AuswahlError::InvalidConfig(format!(
            "cannot select {} features from data with {} features",
            n, n_features
        )));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_mask_breaks_ties_by_index() {
        let weights = Array1::from_vec(vec![0.2, 0.9, 0.5, 0.9, 0.5]);
        let mask = top_k_mask(&weights, 3);
        assert_eq!(mask.to_vec(), vec![false, true, true, true, false]);
    }

    #[test]
    fn test_support_representations_agree() {
        let mask = Array1::from_vec(vec![true, false, true]);
        assert_eq!(Support::from_mask(&mask, true), Support::Indices(vec![0, 2]));
        assert_eq!(Support::from_mask(&mask, false).indices(), vec![0, 2]);
    }

    #[test]
    fn test_feature_descriptor_ordering_and_display() {
        let mut descriptors = vec![
            FeatureDescriptor::from((1usize, 10usize)),
            FeatureDescriptor::from(10usize),
            FeatureDescriptor::from(5usize),
        ];
        descriptors.sort();
        assert_eq!(descriptors[0], FeatureDescriptor::Point(5));
        assert_eq!(descriptors[2].to_string(), "(1, 10)");
        assert_eq!(descriptors[2].n_features(), 10);
    }

    #[test]
    fn test_resolve_n_features() {
        assert_eq!(resolve_n_features(None, 10).unwrap(), 5);
        assert_eq!(resolve_n_features(Some(10), 10).unwrap(), 10);
        assert!(resolve_n_features(Some(11), 10).is_err());
    }
}
