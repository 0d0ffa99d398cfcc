use ndarray::{Array1, Array2};

use crate::config::VissaConfig;
use crate::error::{AuswahlError, Result};
use crate::feature_selection::selector::{
    resolve_n_features, top_k_mask, FeatureDescriptor, FeatureSelector,
};
use crate::feature_selection::vissa::engine::{Accepted, VissaEngine};
use crate::models::regressor_trait::RegressionModel;

/// Feature selection with the Variable Iterative Space Shrinkage Approach.
///
/// Variable importance follows Deng et al., "A novel variable selection
/// approach that iteratively optimizes variable space using weighted binary
/// matrix sampling", Analyst 139, 2014.
///
/// After fitting, `weights()` holds the converged inclusion weight of every
/// feature and the support marks the `n_features_to_select` highest weighted
/// features.
///
/// # Examples
///
/// ```no_run
/// use auswahl::config::VissaConfig;
/// use auswahl::feature_selection::{FeatureSelector, Vissa};
/// use ndarray::{Array1, Array2};
///
/// let x = Array2::from_shape_fn((100, 10), |(i, j)| ((i * 31 + j * 17) % 23) as f64);
/// let y: Array1<f64> = x.column(0).mapv(|v| 5.0 * v) - x.column(5).mapv(|v| 2.0 * v);
///
/// let config = VissaConfig { n_submodels: 200, n_jobs: 2, random_state: Some(0), ..Default::default() };
/// let mut selector = Vissa::new(Some(2), config).unwrap();
/// selector.fit(&x, &y).unwrap();
/// println!("{:?}", selector.get_support(true).unwrap());
/// ```
pub struct Vissa {
    n_features_to_select: Option<usize>,
    config: VissaConfig,
    model: Option<Box<dyn RegressionModel>>,
    weights: Option<Array1<f64>>,
    support: Option<Array1<bool>>,
    score: Option<f64>,
}

impl Vissa {
    /// `n_features_to_select` defaults to half of the features when `None`.
    pub fn new(n_features_to_select: Option<usize>, config: VissaConfig) -> Result<Self> {
        config.validate()?;
        if n_features_to_select == Some(0) {
            return Err(AuswahlError::InvalidConfig(
                "n_features_to_select must be at least 1".to_string(),
            ));
        }
        Ok(Vissa {
            n_features_to_select,
            config,
            model: None,
            weights: None,
            support: None,
            score: None,
        })
    }

    /// Score submodels with `model` instead of the estimator in the config.
    pub fn with_model(mut self, model: Box<dyn RegressionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn config(&self) -> &VissaConfig {
        &self.config
    }

    /// Converged inclusion weights, one per feature.
    pub fn weights(&self) -> Result<&Array1<f64>> {
        self.weights.as_ref().ok_or(AuswahlError::NotFitted)
    }

    /// Best mean top-submodel score reached during fitting.
    pub fn score(&self) -> Result<f64> {
        self.score.ok_or(AuswahlError::NotFitted)
    }

    fn engine(&self) -> Result<VissaEngine> {
        match &self.model {
            Some(model) => VissaEngine::with_model(&self.config, model.fresh()),
            None => VissaEngine::new(&self.config),
        }
    }
}

impl FeatureSelector for Vissa {
    fn name(&self) -> &str {
        "VISSA"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.weights = None;
        self.support = None;
        self.score = None;

        check_input(x, y)?;
        let n_features_to_select = resolve_n_features(self.n_features_to_select, x.ncols())?;

        let engine = self.engine()?;
        let mut rng = engine.rng();
        let threshold = self.config.certainty_threshold();

        log::info!(
            "Fitting VISSA on {} samples x {} features ({} submodels, selecting {})",
            x.nrows(),
            x.ncols(),
            self.config.n_submodels,
            n_features_to_select
        );

        let outcome = engine.converge(x, y, &mut rng, |_prior, weights, score| {
            // early stop: the requested number of features has weight of ca. 1
            let n_certain = weights.iter().filter(|&&w| w >= threshold).count();
            Ok(Accepted {
                stop: n_certain >= n_features_to_select,
                weights,
                score,
            })
        })?;

        self.support = Some(top_k_mask(&outcome.weights, n_features_to_select));
        self.weights = Some(outcome.weights);
        self.score = Some(outcome.score);
        Ok(())
    }

    fn support_mask(&self) -> Result<&Array1<bool>> {
        self.support.as_ref().ok_or(AuswahlError::NotFitted)
    }

    fn configure(&mut self, features: FeatureDescriptor) -> Result<()> {
        self.n_features_to_select = Some(features.n_features());
        Ok(())
    }

    fn reseed(&mut self, seed: u64) {
        self.config.random_state = Some(seed);
    }
}

pub(crate) fn check_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(AuswahlError::InvalidConfig(format!(
            "x has {} samples but y has {}",
            x.nrows(),
            y.len()
        )));
    }
    if x.ncols() == 0 {
        return Err(AuswahlError::InvalidConfig(
            "x must contain at least one feature".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    fn data(seed: u64, n_features: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let x = Array2::from_shape_simple_fn((60, n_features), || StandardNormal.sample(&mut rng));
        let y = x.column(0).mapv(|v| 2.0 * v) - x.column(n_features - 1);
        (x, y)
    }

    fn config(seed: u64) -> VissaConfig {
        VissaConfig {
            n_submodels: 100,
            n_jobs: 2,
            random_state: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_support_before_fit_fails() {
        let selector = Vissa::new(Some(2), config(0)).unwrap();
        assert!(matches!(selector.get_support(false), Err(AuswahlError::NotFitted)));
        assert!(matches!(selector.weights(), Err(AuswahlError::NotFitted)));
    }

    #[test]
    fn test_refit_with_same_seed_is_idempotent() {
        let (x, y) = data(1, 6);
        let mut selector = Vissa::new(Some(2), config(3)).unwrap();

        selector.fit(&x, &y).unwrap();
        let first = selector.get_support(false).unwrap();
        let first_weights = selector.weights().unwrap().clone();

        selector.fit(&x, &y).unwrap();
        assert_eq!(selector.get_support(false).unwrap(), first);
        assert_eq!(selector.weights().unwrap(), &first_weights);
    }

    #[test]
    fn test_selecting_all_features_yields_full_mask() {
        let (x, y) = data(2, 5);
        let mut selector = Vissa::new(Some(5), config(4)).unwrap();
        selector.fit(&x, &y).unwrap();
        let mask = selector.support_mask().unwrap();
        assert!(mask.iter().all(|&s| s));
    }

    #[test]
    fn test_single_feature_dataset() {
        let (x, y) = data(3, 1);
        let mut selector = Vissa::new(Some(1), config(5)).unwrap();
        selector.fit(&x, &y).unwrap();
        assert_eq!(selector.get_support(true).unwrap().indices(), vec![0]);
    }

    #[test]
    fn test_too_many_features_requested() {
        let (x, y) = data(4, 3);
        let mut selector = Vissa::new(Some(4), config(6)).unwrap();
        assert!(matches!(
            selector.fit(&x, &y),
            Err(AuswahlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_configure_and_reseed() {
        let mut selector = Vissa::new(None, config(0)).unwrap();
        selector.configure(FeatureDescriptor::from((2usize, 3usize))).unwrap();
        selector.reseed(99);
        assert_eq!(selector.n_features_to_select, Some(6));
        assert_eq!(selector.config().random_state, Some(99));
    }
}
