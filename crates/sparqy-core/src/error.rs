use thiserror::Error;

/// Top-level error type for sparqy domain and configuration failures.
#[derive(Error, Debug)]
pub enum SparqyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported traversal depth {0}: only 1 or 2 hops are supported")]
    UnsupportedDepth(u32),

    #[error("Invalid IRI: {0:?}")]
    InvalidIri(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for SparqyError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
