// src/error.rs

use thiserror::Error;

/// Failures from the water-data layer.
///
/// The envelope boundary collapses every variant into status "error" with the
/// display text as the message, so downstream consumers see the same shape
/// regardless of cause; the variants exist so callers inside the crate can
/// still tell invalid input from transport and parse failures.
#[derive(Debug, Error)]
pub enum NwisError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("USGS service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse USGS response: {0}")]
    Parse(String),
}
