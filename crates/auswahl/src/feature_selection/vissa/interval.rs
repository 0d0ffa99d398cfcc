use ndarray::{Array1, Array2};

use crate::config::{certainty_threshold, VissaConfig};
use crate::error::{AuswahlError, Result};
use crate::feature_selection::selector::{top_k_mask, FeatureDescriptor, FeatureSelector};
use crate::feature_selection::vissa::engine::{Accepted, VissaEngine};
use crate::feature_selection::vissa::evaluator::SubmodelEvaluator;
use crate::feature_selection::vissa::point::check_input;
use crate::models::regressor_trait::RegressionModel;

/// Outcome of growing intervals around newly confirmed features.
#[derive(Debug, Clone)]
pub struct IntervalGrowth {
    /// Confirmed features followed by the absorbed borders, in order of
    /// acceptance.
    pub features: Vec<usize>,
    /// Input weights with every absorbed border set to 1.
    pub weights: Array1<f64>,
    pub score: f64,
}

/// Features confirmed in `new` and the subset of them not yet confirmed in
/// `prior`.
pub fn newly_selected(
    prior: &Array1<f64>,
    new: &Array1<f64>,
    n_submodels: usize,
) -> (Vec<usize>, Vec<usize>) {
    let threshold = certainty_threshold(n_submodels);
    let confirmed: Vec<usize> = (0..new.len()).filter(|&i| new[i] >= threshold).collect();
    let fresh = confirmed
        .iter()
        .copied()
        .filter(|&i| prior[i] < threshold)
        .collect();
    (confirmed, fresh)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Grow one interval around `feature`, probing left and right borders in
/// alternation.
#[allow(clippy::too_many_arguments)]
fn expand_interval(
    evaluator: &SubmodelEvaluator,
    x: &Array2<f64>,
    y: &Array1<f64>,
    weights: &mut Array1<f64>,
    features: &mut Vec<usize>,
    mut score: f64,
    feature: usize,
    threshold: f64,
) -> Result<f64> {
    let n_features = weights.len();
    // next unprobed index on each side, None once that side is closed
    let mut left = feature.checked_sub(1);
    let mut right = Some(feature + 1).filter(|&i| i < n_features);

    loop {
        let mut progress = false;

        for side in [Side::Left, Side::Right] {
            let border = match side {
                Side::Left => left,
                Side::Right => right,
            };
            let Some(border) = border else { continue };

            let grown = if weights[border] >= threshold {
                true
            } else {
                let mut candidate = features.clone();
                candidate.push(border);
                let candidate_score = evaluator.evaluate_features(x, y, &candidate)?;
                if candidate_score > score {
                    log::debug!(
                        "Absorbed feature {} into the interval around {} (score {:.6})",
                        border,
                        feature,
                        candidate_score
                    );
                    score = candidate_score;
                    features.push(border);
                    weights[border] = 1.0;
                    true
                } else {
                    false
                }
            };

            let next = if grown {
                progress = true;
                match side {
                    Side::Left => border.checked_sub(1),
                    Side::Right => Some(border + 1).filter(|&i| i < n_features),
                }
            } else {
                None
            };
            match side {
                Side::Left => left = next,
                Side::Right => right = next,
            }
        }

        if !progress {
            break;
        }
    }

    Ok(score)
}

/// Expand contiguous intervals around the features that crossed the
/// certainty threshold between `prior_weights` and `new_weights`.
///
/// A border whose weight is already certain is absorbed for free. Any other
/// border joins only if the cross-validated score of the feature set strictly
/// improves; its weight is then marked as certain.
pub fn grow_intervals(
    evaluator: &SubmodelEvaluator,
    x: &Array2<f64>,
    y: &Array1<f64>,
    prior_weights: &Array1<f64>,
    new_weights: Array1<f64>,
    score: f64,
    n_submodels: usize,
) -> Result<IntervalGrowth> {
    let threshold = certainty_threshold(n_submodels);
    let (mut features, fresh) = newly_selected(prior_weights, &new_weights, n_submodels);
    let mut weights = new_weights;
    let mut score = score;

    for feature in fresh {
        score = expand_interval(
            evaluator,
            x,
            y,
            &mut weights,
            &mut features,
            score,
            feature,
            threshold,
        )?;
    }

    Ok(IntervalGrowth {
        features,
        weights,
        score,
    })
}

/// Interval variant of VISSA.
///
/// Refinement runs as for [`Vissa`](super::Vissa), but every accepted round
/// grows contiguous bands around freshly confirmed wavelengths. There is no
/// early stop; the outer loop runs until the score stops improving. The
/// support is the `n_intervals_to_select * interval_width` highest weighted
/// features.
pub struct IVissa {
    n_intervals_to_select: usize,
    interval_width: usize,
    config: VissaConfig,
    model: Option<Box<dyn RegressionModel>>,
    weights: Option<Array1<f64>>,
    support: Option<Array1<bool>>,
    score: Option<f64>,
}

impl IVissa {
    pub fn new(n_intervals_to_select: usize, interval_width: usize, config: VissaConfig) -> Result<Self> {
        config.validate()?;
        if n_intervals_to_select == 0 || interval_width == 0 {
            return Err(AuswahlError::InvalidConfig(format!(
                "intervals must be non-empty, got {} intervals of width {}",
                n_intervals_to_select, interval_width
            )));
        }
        Ok(IVissa {
            n_intervals_to_select,
            interval_width,
            config,
            model: None,
            weights: None,
            support: None,
            score: None,
        })
    }

    pub fn with_model(mut self, model: Box<dyn RegressionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn config(&self) -> &VissaConfig {
        &self.config
    }

    pub fn weights(&self) -> Result<&Array1<f64>> {
        self.weights.as_ref().ok_or(AuswahlError::NotFitted)
    }

    pub fn score(&self) -> Result<f64> {
        self.score.ok_or(AuswahlError::NotFitted)
    }
}

impl FeatureSelector for IVissa {
    fn name(&self) -> &str {
        "iVISSA"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.weights = None;
        self.support = None;
        self.score = None;

        check_input(x, y)?;
        let n_selected = self.n_intervals_to_select * self.interval_width;
        if n_selected > x.ncols() {
            return Err(AuswahlError::InvalidConfig(format!(
                "{} intervals of width {} exceed the {} available features",
                self.n_intervals_to_select,
                self.interval_width,
                x.ncols()
            )));
        }

        let engine = match &self.model {
            Some(model) => VissaEngine::with_model(&self.config, model.fresh())?,
            None => VissaEngine::new(&self.config)?,
        };
        let mut rng = engine.rng();
        let n_submodels = self.config.n_submodels;

        log::info!(
            "Fitting iVISSA on {} samples x {} features ({} intervals of width {})",
            x.nrows(),
            x.ncols(),
            self.n_intervals_to_select,
            self.interval_width
        );

        let outcome = engine.converge(x, y, &mut rng, |prior, weights, score| {
            let growth = grow_intervals(engine.evaluator(), x, y, prior, weights, score, n_submodels)?;
            Ok(Accepted {
                weights: growth.weights,
                score: growth.score,
                stop: false,
            })
        })?;

        self.support = Some(top_k_mask(&outcome.weights, n_selected));
        self.weights = Some(outcome.weights);
        self.score = Some(outcome.score);
        Ok(())
    }

    fn support_mask(&self) -> Result<&Array1<bool>> {
        self.support.as_ref().ok_or(AuswahlError::NotFitted)
    }

    fn configure(&mut self, features: FeatureDescriptor) -> Result<()> {
        match features {
            FeatureDescriptor::Interval { n_intervals, width } if n_intervals > 0 && width > 0 => {
                self.n_intervals_to_select = n_intervals;
                self.interval_width = width;
                Ok(())
            }
            other => Err(AuswahlError::InvalidConfig(format!(
                "iVISSA expects a non-empty interval configuration, got {}",
                other
            ))),
        }
    }

    fn reseed(&mut self, seed: u64) {
        self.config.random_state = Some(seed);
    }
}
