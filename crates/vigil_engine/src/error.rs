//! Error types for the client.

use thiserror::Error;
use vigil_protocol::{ObjectId, ObjectKind, ObjectRecord, ProtocolError, Scope};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while creating and resolving objects.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server rejected the creation command.
    #[error("server rejected {kind} creation on object {target}: {message}")]
    Mutation {
        /// Kind that was being created.
        kind: ObjectKind,
        /// Container or owner the command targeted.
        target: ObjectId,
        /// Rejection reason reported by the server.
        message: String,
    },

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Protocol error (invalid message format).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The created object could not be identified.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The caller cancelled the resolution.
    #[error("resolution cancelled")]
    Cancelled,

    /// Not connected.
    #[error("not connected to server")]
    NotConnected,

    /// A background task failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the failed request itself can be retried.
    ///
    /// The resolution loop never does this: a failed listing ends the
    /// resolution. The flag is for callers deciding whether to re-issue.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        ClientError::Protocol(err.to_string())
    }
}

/// Identity of one unexplained new object, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSummary {
    /// Object id.
    pub id: ObjectId,
    /// Display name (server whitespace trimmed).
    pub name: String,
}

impl From<&ObjectRecord> for CandidateSummary {
    fn from(record: &ObjectRecord) -> Self {
        Self {
            id: record.id,
            name: record.display_name().to_string(),
        }
    }
}

/// The created object could not be identified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// More than one new object appeared where exactly one was expected.
    #[error(
        "could not resolve {kind} in {scope}: expected one new object but found {}: {}",
        .candidates.len(),
        format_candidates(.candidates)
    )]
    Ambiguous {
        /// Kind that was created.
        kind: ObjectKind,
        /// Scope that was searched.
        scope: Scope,
        /// Name the caller asked for, if any. Never used to pick a candidate.
        name_hint: Option<String>,
        /// Every candidate, ordered by id.
        candidates: Vec<CandidateSummary>,
    },

    /// No new object appeared within the attempt budget.
    #[error(
        "could not resolve {kind} in {scope}: server is taking too long to create the object \
         (no new object after {attempts} attempts)"
    )]
    Timeout {
        /// Kind that was created.
        kind: ObjectKind,
        /// Scope that was searched.
        scope: Scope,
        /// Number of "after" listings taken.
        attempts: u32,
    },
}

impl ResolutionError {
    /// Candidate ids carried by the error (empty for timeouts).
    pub fn candidate_ids(&self) -> Vec<ObjectId> {
        match self {
            ResolutionError::Ambiguous { candidates, .. } => {
                candidates.iter().map(|c| c.id).collect()
            }
            ResolutionError::Timeout { .. } => Vec::new(),
        }
    }
}

fn format_candidates(candidates: &[CandidateSummary]) -> String {
    candidates
        .iter()
        .map(|c| format!("{} ({:?})", c.id, c.name))
        .collect::<Vec<_>>()
        .join(", ")
}
