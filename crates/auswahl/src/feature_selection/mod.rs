//! Feature selection methods.
//!
//! Every method implements [`FeatureSelector`]: VISSA and iVISSA search the
//! variable space by weighted binary matrix sampling, and [`SelectKBest`]
//! ranks wavelengths by a univariate F-test as a fast baseline.
pub mod selector;
pub mod univariate_selection;
pub mod vissa;

pub use selector::{FeatureDescriptor, FeatureSelector, Support};
pub use univariate_selection::SelectKBest;
pub use vissa::{IVissa, Vissa};
