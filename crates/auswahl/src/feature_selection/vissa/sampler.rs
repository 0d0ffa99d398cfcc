//! Weighted binary sampling matrices.
//!
//! Row `i` of a matrix produced for weights `w` holds exactly
//! `round(w[i] * n_submodels)` true entries. Their positions are drawn from a
//! single permutation of all matrix cells, cut into one chunk per row, so a
//! given RNG state always yields the same matrix.
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::Rng;

/// Number of submodels that include a feature of weight `weight`.
///
/// Halves round to even and the result is clamped to `[0, n_submodels]`.
pub fn appearance_count(weight: f64, n_submodels: usize) -> usize {
    let raw = (weight * n_submodels as f64).round_ties_even();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        (raw as usize).min(n_submodels)
    }
}

/// Sample a (n_features, n_submodels) binary sampling matrix.
///
/// Column `j` is the feature mask of submodel `j`.
pub fn produce_submodels<R: Rng + ?Sized>(
    weights: &Array1<f64>,
    n_submodels: usize,
    rng: &mut R,
) -> Array2<bool> {
    let n_feats = weights.len();
    let mut bsm = Array2::from_elem((n_feats, n_submodels), false);
    if n_feats == 0 || n_submodels == 0 {
        return bsm;
    }

    let mut permutation: Vec<usize> = (0..n_feats * n_submodels).collect();
    permutation.shuffle(rng);

    let mut order: Vec<usize> = Vec::with_capacity(n_submodels);
    for (i, chunk) in permutation.chunks(n_submodels).enumerate() {
        let appearances = appearance_count(weights[i], n_submodels);

        // argsort of the chunk gives the column permutation for this row
        order.clear();
        order.extend(0..n_submodels);
        order.sort_unstable_by_key(|&j| chunk[j]);

        for (j, &source) in order.iter().enumerate() {
            bsm[(i, j)] = source < appearances;
        }
    }

    bsm
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn row_sums(bsm: &Array2<bool>) -> Vec<usize> {
        bsm.rows()
            .into_iter()
            .map(|row| row.iter().filter(|&&b| b).count())
            .collect()
    }

    #[test]
    fn test_row_sums_are_exact() {
        let weights = Array1::from_vec(vec![0.0, 0.05, 0.5, 0.333, 0.999, 1.0]);
        let n_submodels = 200;
        let bsm = produce_submodels(&weights, n_submodels, &mut StdRng::seed_from_u64(7));

        assert_eq!(bsm.dim(), (6, 200));
        let expected: Vec<usize> = weights
            .iter()
            .map(|&w| (w * n_submodels as f64).round() as usize)
            .collect();
        assert_eq!(row_sums(&bsm), expected);
    }

    #[test]
    fn test_half_rounds_to_even() {
        assert_eq!(appearance_count(0.5, 5), 2);
        assert_eq!(appearance_count(0.5, 7), 4);
        assert_eq!(appearance_count(1.7, 10), 10);
        assert_eq!(appearance_count(-0.2, 10), 0);
        assert_eq!(appearance_count(f64::NAN, 10), 0);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let weights = Array1::from_vec(vec![0.3, 0.5, 0.8, 0.1]);
        let a = produce_submodels(&weights, 50, &mut StdRng::seed_from_u64(42));
        let b = produce_submodels(&weights, 50, &mut StdRng::seed_from_u64(42));
        let c = produce_submodels(&weights, 50, &mut StdRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_single_feature_and_odd_submodel_count() {
        let weights = Array1::from_vec(vec![0.5]);
        let bsm = produce_submodels(&weights, 1, &mut StdRng::seed_from_u64(1));
        assert_eq!(bsm.dim(), (1, 1));
        assert_eq!(row_sums(&bsm), vec![0]);

        let bsm = produce_submodels(&weights, 9, &mut StdRng::seed_from_u64(1));
        assert_eq!(row_sums(&bsm), vec![4]);
    }

    #[test]
    fn test_positions_are_shuffled() {
        let weights = Array1::from_elem(20, 0.5);
        let bsm = produce_submodels(&weights, 100, &mut StdRng::seed_from_u64(3));
        // not every row can start with its 50 true entries
        let all_prefix = bsm
            .rows()
            .into_iter()
            .all(|row| row.iter().take(50).all(|&b| b));
        assert!(!all_prefix);
    }
}
