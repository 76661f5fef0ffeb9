//! Error types for the biograph-query crate.
//!
//! None of these reach the pipeline's caller: synthesis errors degrade to the
//! failure sentinel and export errors become an error presentation result.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("No API key configured for the completion service")]
    MissingApiKey,

    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode completion response: {0}")]
    Decode(String),

    #[error("Completion response contained no choices")]
    EmptyResponse,

    #[error("Completion request timed out after {0}s")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("Too many columns for a worksheet: {0}")]
    TooManyColumns(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
