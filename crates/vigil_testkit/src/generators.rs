//! Property-based test generators using proptest.
//!
//! Provides strategies for listings as a server would return them,
//! including the leading whitespace server templating injects into names.

use proptest::prelude::*;
use std::collections::BTreeSet;
use vigil_protocol::{ObjectId, ObjectKind, ObjectRecord, Scope};

/// Container every generated record lives in.
pub const GENERATED_PARENT: ObjectId = ObjectId(1001);

/// Strategy for generating object kinds that live in containers.
pub fn container_kind_strategy() -> impl Strategy<Value = ObjectKind> {
    prop_oneof![
        Just(ObjectKind::Sensor),
        Just(ObjectKind::Device),
        Just(ObjectKind::Group),
    ]
}

/// Strategy for generating object names, sometimes padded with spaces.
pub fn object_name_strategy() -> impl Strategy<Value = String> {
    (
        0usize..3,
        prop::string::string_regex("[A-Za-z][A-Za-z0-9 :]{0,15}").expect("Invalid regex"),
        0usize..2,
    )
        .prop_map(|(lead, core, trail)| {
            format!("{}{}{}", " ".repeat(lead), core.trim_end(), " ".repeat(trail))
        })
}

/// Strategy for generating a set of distinct ids.
pub fn id_set_strategy(max: usize) -> impl Strategy<Value = BTreeSet<u32>> {
    prop::collection::btree_set(1002u32..1200, 0..max)
}

/// A before/after listing pair of one kind under [`GENERATED_PARENT`].
#[derive(Debug, Clone)]
pub struct ListingPair {
    /// Kind listed.
    pub kind: ObjectKind,
    /// Records in the "before" listing.
    pub before: Vec<ObjectRecord>,
    /// Records in the "after" listing.
    pub after: Vec<ObjectRecord>,
    /// Ids present after but not before.
    pub added: BTreeSet<ObjectId>,
}

impl ListingPair {
    /// Scope both listings were taken in.
    pub fn scope(&self) -> Scope {
        Scope::Parent(GENERATED_PARENT)
    }
}

/// Strategy for generating listing pairs.
///
/// Ids may disappear between listings and surviving objects may be
/// renamed. The "after" listing is shuffled and may contain records from
/// other containers, which must never count as added.
pub fn listing_pair_strategy() -> impl Strategy<Value = ListingPair> {
    (
        container_kind_strategy(),
        id_set_strategy(12),
        id_set_strategy(6),
        prop::collection::vec(object_name_strategy(), 32),
        prop::collection::btree_set(2000u32..2100, 0..3),
        any::<u64>(),
    )
        .prop_map(|(kind, existing, fresh, names, foreign, seed)| {
            let record = |id: u32, i: usize, parent: ObjectId| {
                let name = names[i % names.len()].clone();
                ObjectRecord::new(ObjectId(id), Some(parent), name, kind)
            };

            let before: Vec<ObjectRecord> = existing
                .iter()
                .enumerate()
                .map(|(i, id)| record(*id, i, GENERATED_PARENT))
                .collect();

            let mut after: Vec<ObjectRecord> = existing
                .iter()
                .enumerate()
                .filter(|(i, _)| (seed >> (i % 64)) & 1 == 0 || i % 5 != 0)
                .map(|(i, id)| record(*id, i + 7, GENERATED_PARENT))
                .collect();

            let added: BTreeSet<ObjectId> = fresh
                .iter()
                .filter(|id| !existing.contains(id))
                .map(|id| ObjectId(*id))
                .collect();
            after.extend(
                added
                    .iter()
                    .enumerate()
                    .map(|(i, id)| record(id.as_u32(), i + 13, GENERATED_PARENT)),
            );
            after.extend(
                foreign
                    .iter()
                    .enumerate()
                    .map(|(i, id)| record(*id, i, ObjectId(2001))),
            );

            let len = after.len();
            if len > 1 {
                after.rotate_left((seed as usize) % len);
            }

            ListingPair {
                kind,
                before,
                after,
                added,
            }
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn names_are_never_blank(name in object_name_strategy()) {
            prop_assert!(!name.trim().is_empty());
        }

        #[test]
        fn added_ids_are_new(pair in listing_pair_strategy()) {
            let before: BTreeSet<ObjectId> = pair.before.iter().map(|r| r.id).collect();
            for id in &pair.added {
                prop_assert!(!before.contains(id));
                prop_assert!(pair.after.iter().any(|r| r.id == *id));
            }
        }

        #[test]
        fn listings_hold_one_kind(pair in listing_pair_strategy()) {
            prop_assert!(pair.before.iter().chain(&pair.after).all(|r| r.kind == pair.kind));
        }
    }
}
