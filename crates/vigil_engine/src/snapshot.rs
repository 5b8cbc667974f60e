//! Point-in-time listings of a scope.

use crate::error::ClientResult;
use crate::transport::MonitorTransport;
use std::collections::BTreeSet;
use std::time::Instant;
use vigil_protocol::{ListRequest, ObjectId, ObjectKind, ObjectRecord, Scope};

/// The objects of one kind in one scope, as listed at one instant.
///
/// Only records of the snapshot's kind that match its scope are kept.
/// Server-side filters are advisory: trigger listings, for example,
/// include triggers inherited from the owner's ancestors.
#[derive(Debug, Clone)]
pub struct Snapshot {
    kind: ObjectKind,
    scope: Scope,
    records: Vec<ObjectRecord>,
    captured_at: Instant,
}

impl Snapshot {
    /// Creates a snapshot, dropping records outside the kind and scope.
    pub fn new(kind: ObjectKind, scope: Scope, records: Vec<ObjectRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| r.kind == kind && scope.matches(r))
            .collect();

        Self {
            kind,
            scope,
            records,
            captured_at: Instant::now(),
        }
    }

    /// Kind of object listed.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Scope that was listed.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// When the listing was taken.
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Records in server order.
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    /// The set of ids present.
    pub fn ids(&self) -> BTreeSet<ObjectId> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Source of snapshots.
///
/// Capturing must be read-only. Errors are returned unchanged and end the
/// resolution that asked for the snapshot.
pub trait SnapshotProvider: Send + Sync {
    /// Lists the objects of `kind` within `scope`.
    fn capture(&self, scope: Scope, kind: ObjectKind) -> ClientResult<Snapshot>;
}

impl<T: MonitorTransport> SnapshotProvider for T {
    fn capture(&self, scope: Scope, kind: ObjectKind) -> ClientResult<Snapshot> {
        let response = self.list(&ListRequest::new(kind, scope))?;
        Ok(Snapshot::new(kind, scope, response.records))
    }
}
