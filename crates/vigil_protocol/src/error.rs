//! Error types for the wire protocol.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A query string was missing a required parameter.
    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),

    /// A query parameter had a value that could not be interpreted.
    #[error("invalid value for {name}: {value:?}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Raw value as received.
        value: String,
    },

    /// Unknown object kind in a listing request.
    #[error("unknown object content: {0:?}")]
    UnknownContent(String),
}

impl ProtocolError {
    /// Creates an invalid parameter error.
    pub fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }
}
