//! Request and response messages.

use crate::command::CreateCommand;
use crate::error::{ProtocolError, ProtocolResult};
use crate::object::{ObjectId, ObjectKind, ObjectRecord};
use crate::scope::Scope;
use serde::{Deserialize, Serialize};

/// Listing request for one kind of object within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    /// Kind to list.
    pub kind: ObjectKind,
    /// Server-side filter.
    pub scope: Scope,
}

impl ListRequest {
    /// Creates a listing request.
    pub fn new(kind: ObjectKind, scope: Scope) -> Self {
        Self { kind, scope }
    }

    /// Encodes the request as a table endpoint query string.
    ///
    /// Container scopes filter on `filter_parentid`; owner scopes (used for
    /// triggers) address the owner with `id`.
    pub fn to_query(&self) -> String {
        let content = self.kind.content();
        match self.scope {
            Scope::Global => format!("content={content}"),
            Scope::Parent(id) => format!("content={content}&filter_parentid={id}"),
            Scope::Owner(id) => format!("content={content}&id={id}"),
        }
    }

    /// Parses a table endpoint query string.
    pub fn from_query(query: &str) -> ProtocolResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut content = None;
        let mut scope = Scope::Global;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "content" => content = Some(ObjectKind::from_content(value)?),
                "filter_parentid" => scope = Scope::Parent(parse_id("filter_parentid", value)?),
                "id" => scope = Scope::Owner(parse_id("id", value)?),
                _ => {}
            }
        }

        let kind = content.ok_or(ProtocolError::MissingParameter("content"))?;
        Ok(Self { kind, scope })
    }
}

fn parse_id(name: &'static str, value: &str) -> ProtocolResult<ObjectId> {
    value
        .parse::<u32>()
        .map(ObjectId)
        .map_err(|_| ProtocolError::invalid(name, value))
}

/// Listing response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListResponse {
    /// Records in server order.
    pub records: Vec<ObjectRecord>,
}

impl ListResponse {
    /// Creates a listing response.
    pub fn new(records: Vec<ObjectRecord>) -> Self {
        Self { records }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A creation command addressed at a target object.
///
/// The target is the parent container for sensors, devices and groups,
/// and the owning object for triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Container or owner the command applies to.
    pub target: ObjectId,
    /// The command.
    #[serde(flatten)]
    pub command: CreateCommand,
}

impl CommandRequest {
    /// Creates a command request.
    pub fn new(target: ObjectId, command: CreateCommand) -> Self {
        Self { target, command }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Response to a creation command.
///
/// `accepted` only means the command was queued. It carries no object id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the server accepted the command.
    pub accepted: bool,
    /// Rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    /// An accepted response.
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            error: None,
        }
    }

    /// A rejected response.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            error: Some(error.into()),
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
