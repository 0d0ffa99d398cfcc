//! Variable Iterative Space Shrinkage Approach.
//!
//! A weighted binary sampling matrix draws random submodels, the best scoring
//! fraction of them updates the feature weights, and the procedure repeats
//! until the cross-validated score stops improving.
pub mod engine;
pub mod evaluator;
pub mod interval;
pub mod point;
pub mod sampler;

pub use engine::{Accepted, Convergence, VissaEngine, SCORE_SENTINEL};
pub use evaluator::{SubmodelEvaluator, SubmodelScore};
pub use interval::{grow_intervals, IVissa, IntervalGrowth};
pub use point::Vissa;
