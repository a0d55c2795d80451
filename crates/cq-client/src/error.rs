use thiserror::Error;

/// Errors surfaced by query execution.
#[derive(Error, Debug)]
pub enum Error {
    /// The query could not be combined or compiled.
    #[error("query error: {0}")]
    Query(#[from] cq_core::Error),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A result document could not be applied to the target object.
    #[error("mapping error: {0}")]
    Mapping(String),

    #[error("config error: {0}")]
    Config(String),

    /// The background worker running the operation panicked.
    #[error("background task aborted before completing")]
    TaskAborted,
}

/// Failures reported by the transport or the service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Network-level failure (connect, timeout, broken body).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with its error envelope.
    #[error("service error {code} (HTTP {status}): {message}")]
    Service {
        status: u16,
        code: i64,
        message: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
