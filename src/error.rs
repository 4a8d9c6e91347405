use thiserror::Error;

/// A client-side field rule was violated. Never reaches the network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Transport failure or non-success response from the remote service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RequestError {
    pub status: Option<u16>,
    pub message: String,
}

impl RequestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// A read superseded by a competing mutation. Logged, never returned.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("read cancelled by a pending mutation")]
pub struct CancelledError;

/// Errors surfaced by the cache actor and its client handle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Request failed: {0}")]
    Request(#[from] RequestError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("User validation error: {0}")]
    ValidationError(String),
    #[error("User request error: {0}")]
    RequestError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<CacheError> for UserError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Validation(e) => UserError::ValidationError(e.0),
            CacheError::Request(e) => UserError::RequestError(e.message),
            CacheError::ActorCommunicationError(msg) => UserError::ActorCommunicationError(msg),
        }
    }
}
