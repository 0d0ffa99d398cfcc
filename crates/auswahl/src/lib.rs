//! auswahl: wavelength selection for spectroscopic regression.
//!
//! The crate implements the Variable Iterative Space Shrinkage Approach
//! (VISSA) and its interval variant (iVISSA) on top of a small PLS regression
//! layer, together with a benchmarking harness that compares selection
//! methods by regression performance, selection stability and run time.
//!
//! Selectors implement [`feature_selection::FeatureSelector`]; submodels are
//! scored by k-fold cross-validation on a rayon worker pool.
pub mod benchmarking;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod feature_selection;
pub mod io;
pub mod metrics;
pub mod model_selection;
pub mod models;
pub mod report;

pub use error::{AuswahlError, Result};
