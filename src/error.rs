// ABOUTME: Typed errors for the two external adapters — completion service and spreadsheet.
// ABOUTME: Everything above the adapters propagates with anyhow.

use thiserror::Error;

/// Failures raised while streaming a reply from the completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed stream payload: {0}")]
    Malformed(String),

    #[error("service error: {0}")]
    Service(String),
}

/// Failures raised while appending a row to the spreadsheet.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("not a spreadsheet URL: {0}")]
    InvalidLocator(String),

    #[error("invalid sheet credential: {0}")]
    Credential(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
