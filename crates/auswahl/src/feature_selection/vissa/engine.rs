//! Shared VISSA machinery: the weight-refinement loop and the outer
//! convergence loop.
//!
//! The engine holds no fitted state. Point and interval selectors compose it
//! and customize what happens when an outer iteration improves the score.
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::VissaConfig;
use crate::error::Result;
use crate::feature_selection::vissa::evaluator::{SubmodelEvaluator, SubmodelScore};
use crate::feature_selection::vissa::sampler::produce_submodels;
use crate::models::factory::build_model;
use crate::models::regressor_trait::RegressionModel;

/// Initial best score of every refinement call and of the outer loop.
pub const SCORE_SENTINEL: f64 = -1e7;

/// Weights and score kept after an improving outer iteration.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub weights: Array1<f64>,
    pub score: f64,
    /// Stop the outer loop after this iteration.
    pub stop: bool,
}

/// Result of the outer convergence loop.
#[derive(Debug, Clone)]
pub struct Convergence {
    pub weights: Array1<f64>,
    pub score: f64,
    pub n_iterations: usize,
}

pub struct VissaEngine {
    config: VissaConfig,
    evaluator: SubmodelEvaluator,
}

impl VissaEngine {
    /// Engine scoring submodels with the estimator named in `config.model`.
    pub fn new(config: &VissaConfig) -> Result<Self> {
        Self::with_model(config, build_model(&config.model))
    }

    /// Engine scoring submodels with fresh copies of `model`.
    pub fn with_model(config: &VissaConfig, model: Box<dyn RegressionModel>) -> Result<Self> {
        config.validate()?;
        let evaluator = SubmodelEvaluator::new(model, config.n_cv_folds, config.n_jobs)?;
        Ok(VissaEngine {
            config: config.clone(),
            evaluator,
        })
    }

    pub fn config(&self) -> &VissaConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &SubmodelEvaluator {
        &self.evaluator
    }

    /// RNG owned by one fit call.
    pub fn rng(&self) -> StdRng {
        match self.config.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Sample around `weights` until the mean score of the best submodels
    /// stops improving, for at most `max_inner_rounds` rounds.
    ///
    /// Every round samples from the weights passed in. Returns the best mean
    /// top score together with the inclusion frequencies of the features in
    /// those top submodels; when no round beats the sentinel the input
    /// weights are returned unchanged.
    pub fn yield_best_weights(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        weights: &Array1<f64>,
        rng: &mut StdRng,
    ) -> Result<(f64, Array1<f64>)> {
        let n_submodels = self.config.n_submodels;
        let top_count = self.config.top_count();

        let mut best_score = SCORE_SENTINEL;
        let mut best_weights = weights.clone();

        for round in 0..self.config.max_inner_rounds {
            let bsm = produce_submodels(weights, n_submodels, rng);
            let submodels = self.evaluator.evaluate_submodels(x, y, &bsm)?;
            let ranked = rank_submodels(submodels);

            let top = &ranked[..top_count];
            let avg_top_score = top.iter().map(|s| s.score).sum::<f64>() / top_count as f64;

            log::debug!(
                "Inner round {}: best submodel {:.6}, mean of top {} submodels {:.6}",
                round,
                top[0].score,
                top_count,
                avg_top_score
            );

            if avg_top_score > best_score {
                best_score = avg_top_score;
                best_weights = inclusion_frequencies(&bsm, top);
            } else {
                log::debug!("Refinement stalled after {} rounds", round);
                break;
            }
        }

        Ok((best_score, best_weights))
    }

    /// Repeat refinement from uniform 0.5 weights while the score strictly
    /// improves.
    ///
    /// `on_improvement` receives the previous best weights, the new candidate
    /// weights and their score, and decides what is kept and whether to stop.
    pub fn converge<F>(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut StdRng,
        mut on_improvement: F,
    ) -> Result<Convergence>
    where
        F: FnMut(&Array1<f64>, Array1<f64>, f64) -> Result<Accepted>,
    {
        let mut top_score = SCORE_SENTINEL;
        let mut top_weights = Array1::from_elem(x.ncols(), 0.5);
        let mut n_iterations = 0;

        loop {
            if let Some(max_iter) = self.config.max_iter {
                if n_iterations >= max_iter {
                    log::info!("Reached the limit of {} outer iterations", max_iter);
                    break;
                }
            }
            n_iterations += 1;

            let (score, candidate) = self.yield_best_weights(x, y, &top_weights, rng)?;
            if !(score > top_score) {
                log::info!(
                    "Iteration {}: score {:.6} does not improve on {:.6}; stopping",
                    n_iterations,
                    score,
                    top_score
                );
                break;
            }

            let accepted = on_improvement(&top_weights, candidate, score)?;
            top_score = accepted.score;
            top_weights = accepted.weights;

            log::info!(
                "Iteration {}: score {:.6}, {} features at certainty",
                n_iterations,
                top_score,
                self.count_certain(&top_weights)
            );

            if accepted.stop {
                break;
            }
        }

        Ok(Convergence {
            weights: top_weights,
            score: top_score,
            n_iterations,
        })
    }

    /// Number of features whose weight reached the certainty threshold.
    pub fn count_certain(&self, weights: &Array1<f64>) -> usize {
        let threshold = self.config.certainty_threshold();
        weights.iter().filter(|&&w| w >= threshold).count()
    }
}

/// Order submodels by descending score, ties by submodel index. NaN scores
/// rank last.
fn rank_submodels(mut submodels: Vec<SubmodelScore>) -> Vec<SubmodelScore> {
    let key = |s: &SubmodelScore| if s.score.is_nan() { f64::NEG_INFINITY } else { s.score };
    submodels.sort_by_key(|s| s.index);
    submodels.sort_by(|a, b| key(b).total_cmp(&key(a)));
    submodels
}

/// Fraction of the `top` submodels that include each feature.
fn inclusion_frequencies(bsm: &Array2<bool>, top: &[SubmodelScore]) -> Array1<f64> {
    let mut weights = Array1::<f64>::zeros(bsm.nrows());
    for submodel in top {
        for (i, &included) in bsm.column(submodel.index).iter().enumerate() {
            if included {
                weights[i] += 1.0;
            }
        }
    }
    weights / top.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_distr::{Distribution, StandardNormal};

    fn synthetic(seed: u64) -> (Array2<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let x = Array2::from_shape_simple_fn((60, 8), || StandardNormal.sample(&mut rng));
        let y = x.column(1).mapv(|v| 3.0 * v) + x.column(6);
        (x, y)
    }

    fn small_config() -> VissaConfig {
        VissaConfig {
            n_submodels: 100,
            n_jobs: 2,
            random_state: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_rank_submodels_is_stable_and_descending() {
        let ranked = rank_submodels(vec![
            SubmodelScore { score: -2.0, index: 3 },
            SubmodelScore { score: f64::NAN, index: 0 },
            SubmodelScore { score: -1.0, index: 2 },
            SubmodelScore { score: -1.0, index: 1 },
        ]);
        let order: Vec<usize> = ranked.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_inclusion_frequencies() {
        let bsm = Array2::from_shape_vec((2, 3), vec![true, false, true, true, true, false]).unwrap();
        let top = [
            SubmodelScore { score: 0.0, index: 0 },
            SubmodelScore { score: -1.0, index: 2 },
        ];
        assert_eq!(inclusion_frequencies(&bsm, &top).to_vec(), vec![1.0, 0.5]);
    }

    #[test]
    fn test_refinement_beats_sentinel() {
        let (x, y) = synthetic(5);
        let engine = VissaEngine::new(&small_config()).unwrap();
        let mut rng = engine.rng();
        let start = Array1::from_elem(8, 0.5);

        let (score, weights) = engine.yield_best_weights(&x, &y, &start, &mut rng).unwrap();

        assert!(score > SCORE_SENTINEL);
        assert!(score <= 0.0);
        assert_eq!(weights.len(), 8);
        assert!(weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
        // the informative features appear in every top submodel
        assert_eq!(weights[1], 1.0);
    }

    #[test]
    fn test_converge_respects_iteration_cap() {
        let (x, y) = synthetic(9);
        let config = VissaConfig {
            max_iter: Some(1),
            ..small_config()
        };
        let engine = VissaEngine::new(&config).unwrap();
        let mut rng = engine.rng();
        let mut calls = 0;
        let outcome = engine
            .converge(&x, &y, &mut rng, |_, weights, score| {
                calls += 1;
                Ok(Accepted {
                    weights,
                    score,
                    stop: false,
                })
            })
            .unwrap();
        assert_eq!(outcome.n_iterations, 1);
        assert_eq!(calls, 1);
        assert!(outcome.score > SCORE_SENTINEL);
    }
}
