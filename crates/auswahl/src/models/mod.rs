pub mod factory;
pub mod pls;
pub mod regressor_trait;
