//! Object identities and records as listed by the monitoring server.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned object identifier.
///
/// For sensors, devices and groups this is globally unique. Notification
/// triggers are numbered per owning object (the server's "sub id"), so a
/// trigger id is only meaningful together with its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Returns the raw numeric id.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Kind of monitoring object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A sensor (leaf object, lives under a device).
    Sensor,
    /// A device (lives under a group or probe).
    Device,
    /// A group (lives under another group or probe).
    Group,
    /// A notification trigger attached to an object.
    NotificationTrigger,
}

impl ObjectKind {
    /// All kinds, in listing order.
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Sensor,
        ObjectKind::Device,
        ObjectKind::Group,
        ObjectKind::NotificationTrigger,
    ];

    /// Returns the listing content name used by the server's table endpoint.
    pub fn content(self) -> &'static str {
        match self {
            ObjectKind::Sensor => "sensors",
            ObjectKind::Device => "devices",
            ObjectKind::Group => "groups",
            ObjectKind::NotificationTrigger => "triggers",
        }
    }

    /// Parses a listing content name.
    pub fn from_content(content: &str) -> ProtocolResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.content() == content)
            .ok_or_else(|| ProtocolError::UnknownContent(content.to_string()))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Sensor => "sensor",
            ObjectKind::Device => "device",
            ObjectKind::Group => "group",
            ObjectKind::NotificationTrigger => "notification trigger",
        };
        f.write_str(name)
    }
}

/// One object as returned by a listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object id (sub id for triggers).
    pub id: ObjectId,
    /// Parent container, or owning object for triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    /// Name exactly as reported by the server.
    pub name: String,
    /// Object kind.
    pub kind: ObjectKind,
}

impl ObjectRecord {
    /// Creates a new record.
    pub fn new(
        id: ObjectId,
        parent_id: Option<ObjectId>,
        name: impl Into<String>,
        kind: ObjectKind,
    ) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            kind,
        }
    }

    /// Returns the name with server templating whitespace removed.
    pub fn display_name(&self) -> &str {
        normalize_name(&self.name)
    }

    /// Returns a copy whose name is the display name.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.display_name().to_string(),
            ..self.clone()
        }
    }
}

/// Trims whitespace the server's own templating leaves around generated names.
///
/// Used for display only. Two records with different ids are never merged
/// because their normalized names agree.
pub fn normalize_name(name: &str) -> &str {
    name.trim()
}
