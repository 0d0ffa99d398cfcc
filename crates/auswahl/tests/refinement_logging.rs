//! Installs a capturing logger, which is process-global, so this lives in its
//! own test binary with a single test.

use std::sync::Mutex;

use auswahl::config::VissaConfig;
use auswahl::feature_selection::{FeatureSelector, Vissa};
use log::{Level, LevelFilter, Log, Metadata, Record};
use ndarray::Array2;

struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target().starts_with("auswahl") {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

#[test]
fn inner_rounds_are_logged_at_debug() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Debug);

    let x = Array2::from_shape_fn((40, 6), |(i, j)| (((i + 3) * (j + 2)) % 11) as f64 + 0.05 * i as f64);
    let y = x.column(1).mapv(|v| 2.0 * v) + x.column(4);
    let config = VissaConfig {
        n_submodels: 50,
        random_state: Some(3),
        max_iter: Some(2),
        ..Default::default()
    };
    let mut selector = Vissa::new(Some(2), config).unwrap();
    selector.fit(&x, &y).unwrap();

    let records = CAPTURE.records.lock().unwrap();
    let inner: Vec<&(Level, String)> = records
        .iter()
        .filter(|(_, message)| message.starts_with("Inner round"))
        .collect();
    assert!(!inner.is_empty());
    assert!(inner.iter().all(|(level, _)| *level == Level::Debug));
    assert!(records.iter().any(|(level, _)| *level == Level::Info));
    assert_eq!(log::max_level(), LevelFilter::Debug);
}
