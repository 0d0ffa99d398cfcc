//! Data splitting and cross-validated scoring.
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{AuswahlError, Result};
use crate::metrics::mean_squared_error;
use crate::models::regressor_trait::RegressionModel;

/// K-fold splitter over contiguous, unshuffled blocks of samples.
///
/// The first `n_samples % n_splits` folds hold one extra sample.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(AuswahlError::InvalidConfig(format!(
                "KFold requires at least 2 splits, got {}",
                n_splits
            )));
        }
        Ok(KFold { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Train / test index pairs for `n_samples` samples.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits > n_samples {
            return Err(AuswahlError::Fit(format!(
                "Cannot have number of splits n_splits={} greater than the number of samples: n_samples={}",
                self.n_splits, n_samples
            )));
        }

        let base = n_samples / self.n_splits;
        let extra = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < extra);
            let stop = start + size;
            let test: Vec<usize> = (start..stop).collect();
            let train: Vec<usize> = (0..start).chain(stop..n_samples).collect();
            folds.push((train, test));
            start = stop;
        }
        Ok(folds)
    }
}

/// Negative mean squared error of `model` for every fold of `cv`.
///
/// A fresh copy of `model` is fitted per fold. A matrix without columns is
/// scored as an intercept-only model predicting the mean of the training
/// targets.
pub fn cross_val_score(
    model: &dyn RegressionModel,
    x: &Array2<f64>,
    y: &Array1<f64>,
    cv: &KFold,
) -> Result<Vec<f64>> {
    if x.nrows() != y.len() {
        return Err(AuswahlError::Fit(format!(
            "x has {} samples but y has {}",
            x.nrows(),
            y.len()
        )));
    }

    let mut scores = Vec::with_capacity(cv.n_splits());
    for (train, test) in cv.split(x.nrows())? {
        let y_train = y.select(Axis(0), &train);
        let y_test = y.select(Axis(0), &test);

        let prediction = if x.ncols() == 0 {
            let mean = y_train.sum() / y_train.len() as f64;
            Array1::from_elem(y_test.len(), mean)
        } else {
            let mut estimator = model.fresh();
            estimator.fit(&x.select(Axis(0), &train), &y_train)?;
            estimator.predict(&x.select(Axis(0), &test))?
        };

        scores.push(-mean_squared_error(&y_test, &prediction));
    }
    Ok(scores)
}

/// Split rows into a shuffled train and test part.
///
/// `train_size` is a fraction in (0, 1); the train part receives
/// `floor(train_size * n_samples)` rows and the test part the rest.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    train_size: f64,
    seed: u64,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    if !(train_size > 0.0 && train_size < 1.0) {
        return Err(AuswahlError::InvalidConfig(format!(
            "train_size must be in (0, 1), got {}",
            train_size
        )));
    }
    let n_samples = x.nrows();
    let n_train = (train_size * n_samples as f64).floor() as usize;
    let n_test = n_samples - n_train;
    if n_train == 0 || n_test == 0 {
        return Err(AuswahlError::InvalidConfig(format!(
            "train_size={} leaves an empty split for {} samples",
            train_size, n_samples
        )));
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    permutation.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test, train) = permutation.split_at(n_test);

    Ok((
        x.select(Axis(0), train),
        x.select(Axis(0), test),
        y.select(Axis(0), train),
        y.select(Axis(0), test),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pls::PlsRegression;

    #[test]
    fn test_kfold_sizes_follow_remainder_rule() {
        let folds = KFold::new(3).unwrap().split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|(_, test)| test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(folds[1].1, vec![4, 5, 6]);
        assert_eq!(folds[1].0.len(), 7);
    }

    #[test]
    fn test_kfold_rejects_more_splits_than_samples() {
        assert!(KFold::new(5).unwrap().split(3).is_err());
        assert!(KFold::new(1).is_err());
    }

    #[test]
    fn test_cross_val_score_is_zero_for_exact_relation() {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let y = x.column(0).mapv(|v| 2.0 * v) + x.column(1).mapv(|v| -v);
        let scores = cross_val_score(&PlsRegression::new(2, true), &x, &y, &KFold::new(5).unwrap())
            .unwrap();
        assert_eq!(scores.len(), 5);
        assert!(scores.iter().all(|s| s.abs() < 1e-10));
    }

    #[test]
    fn test_cross_val_score_without_columns_uses_mean() {
        let x = Array2::<f64>::zeros((4, 0));
        let y = Array1::from_vec(vec![1.0, 1.0, 3.0, 3.0]);
        let scores = cross_val_score(&PlsRegression::default(), &x, &y, &KFold::new(2).unwrap())
            .unwrap();
        assert_eq!(scores, vec![-4.0, -4.0]);
    }

    #[test]
    fn test_train_test_split_partitions_rows() {
        let x = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let y = Array1::from_iter((0..10).map(|i| i as f64));
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.7, 3).unwrap();
        assert_eq!(x_train.nrows(), 7);
        assert_eq!(x_test.nrows(), 3);
        assert_eq!(x_train.column(0), y_train);
        assert_eq!(x_test.column(0), y_test);

        let mut all: Vec<f64> = y_train.iter().chain(y_test.iter()).copied().collect();
        all.sort_by(f64::total_cmp);
        assert_eq!(all, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_train_test_split_sizes_floor_the_train_part() {
        let x = Array2::zeros((10, 2));
        let y = Array1::zeros(10);
        for (train_size, expected) in [(0.7, 7), (0.3, 3), (0.75, 7), (0.99, 9), (0.1, 1)] {
            let (x_train, x_test, _, _) = train_test_split(&x, &y, train_size, 0).unwrap();
            assert_eq!(x_train.nrows(), expected, "train_size={}", train_size);
            assert_eq!(x_test.nrows(), 10 - expected);
        }
        assert!(train_test_split(&x, &y, 0.05, 0).is_err());
    }
}
