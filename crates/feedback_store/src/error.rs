use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{method} {url} could not be completed: {source}")]
    NetworkFailure {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} was rejected with status {status}")]
    ServerRejected {
        method: Method,
        url: String,
        status: StatusCode,
    },
    #[error("unexpected response body from {url}: {source}")]
    DecodeFailure {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("initial feedback load has already been started")]
    LoadAlreadyStarted,
    #[error("invalid feedback endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl StoreError {
    /// Status code returned by the server, when the failure was a rejection.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
