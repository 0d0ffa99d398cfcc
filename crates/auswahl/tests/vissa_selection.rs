use auswahl::config::VissaConfig;
use auswahl::feature_selection::{FeatureSelector, IVissa, Vissa};
use auswahl::AuswahlError;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// 100 x 10 spectra with y = 5 * x0 - 2 * x5.
fn two_informative(seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = Array2::from_shape_simple_fn((100, 10), || StandardNormal.sample(&mut rng));
    let y = x.column(0).mapv(|v| 5.0 * v) - x.column(5).mapv(|v| 2.0 * v);
    (x, y)
}

fn config(seed: u64) -> VissaConfig {
    VissaConfig {
        n_submodels: 200,
        n_jobs: 4,
        random_state: Some(seed),
        ..Default::default()
    }
}

#[test]
fn test_vissa_recovers_informative_wavelengths() {
    let n_runs = 20;
    let mut hits = 0;
    for seed in 0..n_runs {
        let (x, y) = two_informative(1000 + seed);
        let mut selector = Vissa::new(Some(2), config(seed)).expect("valid config");
        selector.fit(&x, &y).expect("fit failed");

        let support = selector.get_support(true).expect("fitted").indices();
        if support == vec![0, 5] {
            hits += 1;
        }
    }
    assert!(
        hits * 10 >= n_runs * 9,
        "selected {{0, 5}} in only {} of {} runs",
        hits,
        n_runs
    );
}

#[test]
fn test_vissa_is_reproducible_per_seed() {
    let (x, y) = two_informative(7);

    let mut first = Vissa::new(Some(2), config(42)).unwrap();
    let mut second = Vissa::new(Some(2), config(42)).unwrap();
    first.fit(&x, &y).unwrap();
    second.fit(&x, &y).unwrap();

    assert_eq!(first.weights().unwrap(), second.weights().unwrap());
    assert_eq!(first.score().unwrap(), second.score().unwrap());
}

#[test]
fn test_vissa_selecting_every_wavelength() {
    let (x, y) = two_informative(3);
    let mut selector = Vissa::new(Some(10), config(1)).unwrap();
    selector.fit(&x, &y).unwrap();
    assert_eq!(selector.get_support(true).unwrap().indices(), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_queries_before_fit() {
    let selector = Vissa::new(Some(2), config(0)).unwrap();
    assert!(matches!(selector.get_support(true), Err(AuswahlError::NotFitted)));
    assert!(matches!(selector.score(), Err(AuswahlError::NotFitted)));

    let selector = IVissa::new(1, 2, config(0)).unwrap();
    assert!(matches!(selector.weights(), Err(AuswahlError::NotFitted)));
}

#[test]
fn test_single_wavelength_dataset() {
    let mut rng = StdRng::seed_from_u64(5);
    let x = Array2::from_shape_simple_fn((30, 1), || StandardNormal.sample(&mut rng));
    let y = x.column(0).mapv(|v| 3.0 * v + 1.0);

    let mut selector = Vissa::new(Some(1), config(2)).unwrap();
    selector.fit(&x, &y).unwrap();
    assert_eq!(selector.get_support(true).unwrap().indices(), vec![0]);
}

#[test]
fn test_invalid_configurations() {
    let bad_folds = VissaConfig {
        n_cv_folds: 1,
        ..Default::default()
    };
    assert!(matches!(Vissa::new(Some(2), bad_folds), Err(AuswahlError::InvalidConfig(_))));

    let no_submodels = VissaConfig {
        n_submodels: 0,
        ..Default::default()
    };
    assert!(matches!(Vissa::new(Some(2), no_submodels), Err(AuswahlError::InvalidConfig(_))));

    assert!(IVissa::new(0, 3, VissaConfig::default()).is_err());
}

#[test]
fn test_ivissa_selects_requested_band_size() {
    let (x, y) = two_informative(11);
    let mut selector = IVissa::new(2, 2, config(4)).unwrap();
    selector.fit(&x, &y).unwrap();

    let support = selector.get_support(true).unwrap().indices();
    assert_eq!(support.len(), 4);
    assert!(selector.score().unwrap() > -1e7);
}
