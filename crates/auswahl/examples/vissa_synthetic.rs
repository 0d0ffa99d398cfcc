use auswahl::config::VissaConfig;
use auswahl::feature_selection::{FeatureSelector, IVissa, Vissa};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 100 synthetic spectra with 30 wavelengths; the response depends on
    // wavelength 4 and on the band 15..18
    let mut rng = StdRng::seed_from_u64(0);
    let x = Array2::from_shape_simple_fn((100, 30), || StandardNormal.sample(&mut rng));
    let y: Array1<f64> = x.column(4).mapv(|v| 5.0 * v)
        + &x.column(15)
        + &x.column(16)
        + &x.column(17);

    println!("Synthetic X shape: {:?}", x.shape());

    let config = VissaConfig {
        n_submodels: 500,
        n_jobs: 4,
        random_state: Some(7),
        ..Default::default()
    };

    let mut vissa = Vissa::new(Some(4), config.clone())?;
    vissa.fit(&x, &y)?;
    println!(
        "VISSA selected {:?} (score {:.4})",
        vissa.get_support(true)?.indices(),
        vissa.score()?
    );

    let mut ivissa = IVissa::new(1, 3, config)?;
    ivissa.fit(&x, &y)?;
    println!(
        "iVISSA selected {:?} (score {:.4})",
        ivissa.get_support(true)?.indices(),
        ivissa.score()?
    );

    Ok(())
}
