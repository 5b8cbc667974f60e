//! Listing scopes.

use crate::object::{ObjectId, ObjectRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The filter a listing is restricted to.
///
/// `Parent` follows the container hierarchy (children of a group or
/// device). `Owner` is used for notification triggers, which hang off an
/// object rather than live inside it; a trigger listing for an owner also
/// returns triggers inherited from the owner's ancestors, and those carry
/// the ancestor as their `parent_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "id")]
pub enum Scope {
    /// No restriction.
    Global,
    /// Direct children of a container.
    Parent(ObjectId),
    /// Objects attached directly to an owner (not inherited).
    Owner(ObjectId),
}

impl Scope {
    /// Returns true if the record belongs to this scope.
    pub fn matches(&self, record: &ObjectRecord) -> bool {
        match self {
            Scope::Global => true,
            Scope::Parent(id) | Scope::Owner(id) => record.parent_id == Some(*id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Parent(id) => write!(f, "parent:{id}"),
            Scope::Owner(id) => write!(f, "owner:{id}"),
        }
    }
}
