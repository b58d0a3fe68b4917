//! Client construction errors

use thiserror::Error;

/// Errors raised while building a [`crate::CdoClient`]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
