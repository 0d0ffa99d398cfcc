//! Cross-validated scoring of submodels.
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::diagnostics::QuietDiagnostics;
use crate::error::{AuswahlError, Result};
use crate::model_selection::{cross_val_score, KFold};
use crate::models::regressor_trait::RegressionModel;

/// Score of one submodel, tagged with its column in the sampling matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmodelScore {
    pub score: f64,
    pub index: usize,
}

/// Fits fresh copies of an estimator template under k-fold cross-validation.
///
/// Batches of submodels are scored on a dedicated worker pool. Tasks share
/// nothing mutable; results are tagged with their submodel index.
pub struct SubmodelEvaluator {
    template: Box<dyn RegressionModel>,
    cv: KFold,
    pool: ThreadPool,
}

impl SubmodelEvaluator {
    pub fn new(template: Box<dyn RegressionModel>, n_cv_folds: usize, n_jobs: usize) -> Result<Self> {
        let cv = KFold::new(n_cv_folds)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_jobs.max(1))
            .build()
            .map_err(|e| AuswahlError::ThreadPool(e.to_string()))?;
        Ok(SubmodelEvaluator { template, cv, pool })
    }

    pub fn n_jobs(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn cv_mean(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let scores = cross_val_score(self.template.as_ref(), x, y, &self.cv)?;
        Ok(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    /// Mean negative MSE over the folds for the given (already masked) matrix.
    pub fn evaluate(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let _quiet = QuietDiagnostics::new();
        self.cv_mean(x, y)
    }

    /// Score the columns `features` of `x`.
    pub fn evaluate_features(&self, x: &Array2<f64>, y: &Array1<f64>, features: &[usize]) -> Result<f64> {
        self.evaluate(&x.select(Axis(1), features), y)
    }

    /// Score every column of the binary sampling matrix `bsm`.
    ///
    /// The first failing submodel fails the whole batch. Results are not
    /// guaranteed to be ordered; use `SubmodelScore::index`.
    pub fn evaluate_submodels(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        bsm: &Array2<bool>,
    ) -> Result<Vec<SubmodelScore>> {
        if bsm.nrows() != x.ncols() {
            return Err(AuswahlError::Fit(format!(
                "sampling matrix covers {} features but x has {}",
                bsm.nrows(),
                x.ncols()
            )));
        }

        let _quiet = QuietDiagnostics::new();
        self.pool.install(|| {
            (0..bsm.ncols())
                .into_par_iter()
                .map(|index| {
                    let features: Vec<usize> = bsm
                        .column(index)
                        .iter()
                        .enumerate()
                        .filter_map(|(i, &included)| if included { Some(i) } else { None })
                        .collect();
                    let score = self.cv_mean(&x.select(Axis(1), &features), y)?;
                    Ok(SubmodelScore { score, index })
                })
                .collect::<Result<Vec<_>>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pls::PlsRegression;

    struct FailingModel;

    impl RegressionModel for FailingModel {
        fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
            Err(AuswahlError::Fit("singular matrix".to_string()))
        }

        fn predict(&self, _x: &Array2<f64>) -> Result<Array1<f64>> {
            Err(AuswahlError::NotFitted)
        }

        fn fresh(&self) -> Box<dyn RegressionModel> {
            Box::new(FailingModel)
        }
    }

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((30, 4), |(i, j)| (((i + 1) * (j + 3)) % 13) as f64 + 0.1 * j as f64);
        let y = x.column(0).mapv(|v| 1.5 * v) - x.column(2);
        (x, y)
    }

    #[test]
    fn test_parallel_scores_match_sequential() {
        let (x, y) = data();
        let bsm = Array2::from_shape_fn((4, 6), |(i, j)| (i + j) % 2 == 0 || j == 5);

        let sequential = SubmodelEvaluator::new(Box::new(PlsRegression::new(4, true)), 5, 1).unwrap();
        let parallel = SubmodelEvaluator::new(Box::new(PlsRegression::new(4, true)), 5, 3).unwrap();
        assert_eq!(parallel.n_jobs(), 3);

        let mut a = sequential.evaluate_submodels(&x, &y, &bsm).unwrap();
        let mut b = parallel.evaluate_submodels(&x, &y, &bsm).unwrap();
        a.sort_by_key(|s| s.index);
        b.sort_by_key(|s| s.index);
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);

        // the full feature set contains the exact relation
        let full = a.iter().find(|s| s.index == 5).unwrap();
        assert!(full.score.abs() < 1e-8);
    }

    #[test]
    fn test_empty_submodel_is_scored_not_failed() {
        let (x, y) = data();
        let bsm = Array2::from_elem((4, 2), false);
        let evaluator = SubmodelEvaluator::new(Box::new(FailingModel), 3, 2).unwrap();
        let scores = evaluator.evaluate_submodels(&x, &y, &bsm).unwrap();
        assert!(scores.iter().all(|s| s.score < 0.0));
    }

    #[test]
    fn test_fitting_error_fails_batch() {
        let (x, y) = data();
        let mut bsm = Array2::from_elem((4, 3), false);
        bsm[(1, 2)] = true;
        let evaluator = SubmodelEvaluator::new(Box::new(FailingModel), 3, 2).unwrap();
        assert!(matches!(
            evaluator.evaluate_submodels(&x, &y, &bsm),
            Err(AuswahlError::Fit(_))
        ));
    }

    #[test]
    fn test_mismatched_matrix_is_rejected() {
        let (x, y) = data();
        let bsm = Array2::from_elem((3, 2), true);
        let evaluator = SubmodelEvaluator::new(Box::new(PlsRegression::default()), 3, 1).unwrap();
        assert!(evaluator.evaluate_submodels(&x, &y, &bsm).is_err());
    }
}
