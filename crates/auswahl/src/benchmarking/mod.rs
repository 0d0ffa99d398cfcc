//! Benchmarking of selection methods: the results store, stability scores
//! and the benchmark driver.
pub mod benchmark;
pub mod data_handling;
pub mod stability;

pub use benchmark::benchmark;
pub use data_handling::{DataHandler, Dataset, DatasetMeta, Entry, KeyFilter, RegressionSummary, ResultQuery};
pub use stability::{DengScore, StabilityScore, ZucknickScore};
