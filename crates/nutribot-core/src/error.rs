use thiserror::Error;

/// Top-level error type shared by the NutriBot crates.
///
/// Subsystem crates define their own error types and implement
/// `From<NutriError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NutriError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for NutriError {
    fn from(err: toml::de::Error) -> Self {
        NutriError::Config(err.to_string())
    }
}

/// A specialized `Result` type for NutriBot operations.
pub type Result<T> = std::result::Result<T, NutriError>;
