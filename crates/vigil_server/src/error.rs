//! Error types for the reference server.

use vigil_protocol::{ObjectId, ObjectKind, ProtocolError};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the reference server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A request referenced an object that does not exist.
    #[error("object {0} does not exist")]
    UnknownObject(ObjectId),

    /// The object cannot be created under the given parent.
    #[error("cannot add a {kind} to {parent_kind} {parent}")]
    InvalidParent {
        /// Kind being created.
        kind: ObjectKind,
        /// Parent id.
        parent: ObjectId,
        /// Parent kind.
        parent_kind: ObjectKind,
    },

    /// A required property was missing or empty.
    #[error("{0} must be set")]
    MissingProperty(&'static str),

    /// No route matched the request path.
    #[error("no such endpoint: {0}")]
    NotFound(String),

    /// Protocol encoding error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Every object id has been handed out.
    #[error("object id space exhausted")]
    IdsExhausted,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::UnknownObject(_)
                | ServerError::InvalidParent { .. }
                | ServerError::MissingProperty(_)
                | ServerError::NotFound(_)
                | ServerError::Protocol(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::Internal(_) | ServerError::IdsExhausted)
    }
}
