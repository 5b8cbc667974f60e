//! Property tests for differencing and disambiguation.

use proptest::prelude::*;
use std::collections::BTreeSet;
use vigil_engine::{
    diff, select, Cardinality, KindDescriptor, ResolutionOutcome, ResolutionRequest, Selection,
    Snapshot,
};
use vigil_protocol::ObjectId;
use vigil_testkit::{listing_pair_strategy, ListingPair, PropTestConfig, GENERATED_PARENT};

fn snapshots(pair: &ListingPair) -> (Snapshot, Snapshot) {
    (
        Snapshot::new(pair.kind, pair.scope(), pair.before.clone()),
        Snapshot::new(pair.kind, pair.scope(), pair.after.clone()),
    )
}

fn request(pair: &ListingPair, cardinality: Cardinality) -> ResolutionRequest {
    ResolutionRequest::new(KindDescriptor::of(pair.kind), GENERATED_PARENT, true)
        .with_cardinality(cardinality)
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn diff_is_exactly_the_added_ids(pair in listing_pair_strategy()) {
        let (before, after) = snapshots(&pair);
        let ids: BTreeSet<ObjectId> = diff(&before, &after).iter().map(|r| r.id).collect();
        prop_assert_eq!(ids, pair.added.clone());
    }

    #[test]
    fn diff_is_ordered_and_in_scope(pair in listing_pair_strategy()) {
        let (before, after) = snapshots(&pair);
        let candidates = diff(&before, &after);
        prop_assert!(candidates.windows(2).all(|w| w[0].id < w[1].id));
        prop_assert!(candidates.iter().all(|r| r.parent_id == Some(GENERATED_PARENT)));
    }

    #[test]
    fn diff_of_a_listing_with_itself_is_empty(pair in listing_pair_strategy()) {
        let (_, after) = snapshots(&pair);
        prop_assert!(diff(&after, &after).is_empty());
    }

    #[test]
    fn plural_selection_keeps_every_candidate(pair in listing_pair_strategy()) {
        let (before, after) = snapshots(&pair);
        let candidates = diff(&before, &after);
        let count = candidates.len();

        match select(candidates, &request(&pair, Cardinality::Many)) {
            Selection::NotYet => prop_assert_eq!(count, 0),
            Selection::Settled(ResolutionOutcome::ResolvedMany(records)) => {
                prop_assert_eq!(records.len(), count);
                for record in &records {
                    prop_assert_eq!(record.name.trim(), record.name.as_str());
                }
            }
            Selection::Settled(other) => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn singular_selection_never_guesses(pair in listing_pair_strategy()) {
        let (before, after) = snapshots(&pair);
        let candidates = diff(&before, &after);
        let count = candidates.len();

        match select(candidates, &request(&pair, Cardinality::One)) {
            Selection::NotYet => prop_assert_eq!(count, 0),
            Selection::Settled(ResolutionOutcome::Resolved(record)) => {
                prop_assert_eq!(count, 1);
                prop_assert!(pair.added.contains(&record.id));
            }
            Selection::Settled(ResolutionOutcome::Ambiguous(records)) => {
                prop_assert!(count > 1);
                prop_assert_eq!(records.len(), count);
            }
            Selection::Settled(other) => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }
}
