use thiserror::Error;

/// Top-level error type for Biograph.
///
/// Only startup defects surface through this type; expected per-question
/// failures are folded into `PresentationResult`.
#[derive(Error, Debug)]
pub enum BiographError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, BiographError>;
