//! Before/after set difference.

use crate::snapshot::Snapshot;
use vigil_protocol::ObjectRecord;

/// Returns the records in `after` whose id does not occur in `before`.
///
/// Identity is the id alone; names may still change between listings.
/// Candidates are restricted to the scope of `after` and ordered by id.
/// Identical id sets yield an empty result, which just means the server
/// has not applied the command yet.
pub fn diff(before: &Snapshot, after: &Snapshot) -> Vec<ObjectRecord> {
    let known = before.ids();
    let scope = after.scope();

    let mut candidates: Vec<ObjectRecord> = after
        .records()
        .iter()
        .filter(|r| scope.matches(r) && !known.contains(&r.id))
        .cloned()
        .collect();

    candidates.sort_by_key(|r| r.id);
    candidates.dedup_by_key(|r| r.id);
    candidates
}
