use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AuswahlError, Result};

/// Central configuration for the regression estimators used to score submodels
/// and to evaluate selections.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported regression models and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    /// Partial least squares regression (single response, `linfa-pls`).
    PLS {
        n_components: usize,
        scale: bool,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::PLS {
            n_components: 2,
            scale: true,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pls" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self { model_type }
    }

    pub fn pls(n_components: usize) -> Self {
        Self {
            model_type: ModelType::PLS {
                n_components,
                scale: true,
            },
        }
    }
}

/// Hyper-parameters shared by the VISSA family of selectors.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VissaConfig {
    /// Number of submodels sampled in every inner round.
    pub n_submodels: usize,
    /// Size of the worker pool evaluating submodels.
    pub n_jobs: usize,
    /// Number of cross-validation folds used to score a feature set.
    pub n_cv_folds: usize,
    /// Fraction of best submodels used to update the weights.
    pub selection_quantile: f64,
    /// Upper bound on sampling rounds inside one refinement call.
    pub max_inner_rounds: usize,
    /// Optional upper bound on outer iterations; unbounded when `None`.
    pub max_iter: Option<usize>,
    /// Seed for the sampling RNG; drawn from entropy when `None`.
    pub random_state: Option<u64>,
    /// Estimator used to score submodels.
    pub model: ModelConfig,
}

impl Default for VissaConfig {
    fn default() -> Self {
        Self {
            n_submodels: 1000,
            n_jobs: 1,
            n_cv_folds: 5,
            selection_quantile: 0.05,
            max_inner_rounds: 5,
            max_iter: None,
            random_state: None,
            model: ModelConfig::default(),
        }
    }
}

impl VissaConfig {
    /// Reject out-of-range values before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.n_submodels == 0 {
            return Err(AuswahlError::InvalidConfig(
                "n_submodels must be at least 1".to_string(),
            ));
        }
        if self.n_jobs == 0 {
            return Err(AuswahlError::InvalidConfig(
                "n_jobs must be at least 1".to_string(),
            ));
        }
        if self.n_cv_folds < 2 {
            return Err(AuswahlError::InvalidConfig(format!(
                "n_cv_folds must be at least 2, got {}",
                self.n_cv_folds
            )));
        }
        if !(self.selection_quantile > 0.0 && self.selection_quantile <= 1.0) {
            return Err(AuswahlError::InvalidConfig(format!(
                "selection_quantile must be in (0, 1], got {}",
                self.selection_quantile
            )));
        }
        if self.max_inner_rounds == 0 {
            return Err(AuswahlError::InvalidConfig(
                "max_inner_rounds must be at least 1".to_string(),
            ));
        }
        match self.model.model_type {
            ModelType::PLS { n_components, .. } if n_components == 0 => {
                Err(AuswahlError::InvalidConfig(
                    "PLS requires at least one component".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Number of best submodels that feed the weight update.
    pub fn top_count(&self) -> usize {
        ((self.selection_quantile * self.n_submodels as f64).floor() as usize)
            .clamp(1, self.n_submodels)
    }

    /// Weight at or above which a feature counts as always selected.
    pub fn certainty_threshold(&self) -> f64 {
        certainty_threshold(self.n_submodels)
    }
}

pub(crate) fn certainty_threshold(n_submodels: usize) -> f64 {
    (n_submodels as f64 - 0.5) / n_submodels as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_from_str() {
        assert_eq!("PLS".parse::<ModelType>().unwrap(), ModelType::default());
        assert!("xgboost".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_top_count_never_zero() {
        let config = VissaConfig {
            n_submodels: 10,
            ..Default::default()
        };
        assert_eq!(config.top_count(), 1);
        assert_eq!(VissaConfig::default().top_count(), 50);
    }

    #[test]
    fn test_validate_rejects_single_fold() {
        let config = VissaConfig {
            n_cv_folds: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuswahlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_json_roundtrip_uses_defaults() {
        let config: VissaConfig = serde_json::from_str(r#"{"n_submodels": 200}"#).unwrap();
        assert_eq!(config.n_submodels, 200);
        assert_eq!(config.n_cv_folds, 5);
        assert_eq!(config.model, ModelConfig::default());
    }
}
