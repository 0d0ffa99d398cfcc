use thiserror::Error;

/// Errors raised by selectors, estimators and the benchmarking store.
#[derive(Debug, Error)]
pub enum AuswahlError {
    /// Support or weights were requested before `fit` completed.
    #[error("selector is not fitted yet; call `fit` before querying the support")]
    NotFitted,

    /// A hyper-parameter is out of range or inconsistent with the data.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The regression estimator could not be fitted or evaluated.
    #[error("fitting failed: {0}")]
    Fit(String),

    /// A results-store lookup named an item that is not registered.
    #[error("Item {item} not present in level {level}")]
    KeyNotFound { item: String, level: String },

    #[error("could not build worker pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl AuswahlError {
    pub(crate) fn key_not_found(item: impl ToString, level: &str) -> Self {
        AuswahlError::KeyNotFound {
            item: item.to_string(),
            level: level.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuswahlError>;
