use crate::config::{ModelConfig, ModelType};
use crate::models::pls::PlsRegression;
use crate::models::regressor_trait::RegressionModel;

/// Build a boxed regression model from a `ModelConfig`.
/// Currently this is a thin factory implemented as a single function.
pub fn build_model(params: &ModelConfig) -> Box<dyn RegressionModel> {
    match params.model_type {
        ModelType::PLS {
            n_components,
            scale,
        } => Box::new(PlsRegression::new(n_components, scale)),
    }
}
