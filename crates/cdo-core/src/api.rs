//! Request-issuance boundary
//!
//! Errors reported by whatever issues HTTP requests on behalf of a workflow.
//! NotFound is kept distinct from other non-2xx responses because its meaning
//! depends on the workflow: a delete-confirmation loop treats it as success,
//! a read loop as failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the request-issuance collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered 404
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The server answered with a non-2xx status other than 404
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// HTTP method of a request descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// What a NotFound response means to the probe that received it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnNotFound {
    /// The resource is gone, which is what the workflow waits for
    Success,
    /// The resource should exist; report the error
    Failure,
}

impl OnNotFound {
    /// Turn a fetch result into a probe result
    ///
    /// With `Success`, a NotFound becomes `Ok(None)` so the caller can treat a
    /// missing resource as "done". Other errors pass through unchanged.
    pub fn resolve<T>(self, result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() && self == OnNotFound::Success => Ok(None),
            Err(err) => Err(err),
        }
    }
}
