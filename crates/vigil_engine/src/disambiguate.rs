//! Narrowing candidates down to what a creation produced.

use crate::request::{Cardinality, ResolutionOutcome, ResolutionRequest};
use vigil_protocol::ObjectRecord;

/// Result of examining one candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing new yet; look again later.
    NotYet,
    /// A terminal outcome.
    Settled(ResolutionOutcome),
}

/// Decides what a candidate set means for the request.
///
/// Several candidates for a singular request are always ambiguous: the
/// name hint is never used to pick one, since a wrong pick silently hands
/// the caller someone else's object. Returned records carry display
/// names; ids are never merged on account of their names.
pub fn select(mut candidates: Vec<ObjectRecord>, request: &ResolutionRequest) -> Selection {
    if candidates.is_empty() {
        return Selection::NotYet;
    }

    candidates.sort_by_key(|r| r.id);
    let candidates: Vec<ObjectRecord> = candidates.iter().map(ObjectRecord::normalized).collect();

    let outcome = match request.cardinality {
        Cardinality::Many => ResolutionOutcome::ResolvedMany(candidates),
        Cardinality::One if candidates.len() == 1 => {
            let mut candidates = candidates;
            ResolutionOutcome::Resolved(candidates.remove(0))
        }
        Cardinality::One => ResolutionOutcome::Ambiguous(candidates),
    };
    Selection::Settled(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::KindDescriptor;
    use vigil_protocol::{ObjectId, ObjectKind};

    fn device(id: u32, name: &str) -> ObjectRecord {
        ObjectRecord::new(ObjectId(id), Some(ObjectId(1001)), name, ObjectKind::Device)
    }

    fn request(cardinality: Cardinality) -> ResolutionRequest {
        ResolutionRequest::new(KindDescriptor::of(ObjectKind::Device), ObjectId(1001), true)
            .with_cardinality(cardinality)
    }

    #[test]
    fn empty_is_not_yet() {
        assert_eq!(select(vec![], &request(Cardinality::One)), Selection::NotYet);
        assert_eq!(select(vec![], &request(Cardinality::Many)), Selection::NotYet);
    }

    #[test]
    fn single_candidate_singular() {
        let selection = select(vec![device(1002, " Probe Device2")], &request(Cardinality::One));
        assert_eq!(
            selection,
            Selection::Settled(ResolutionOutcome::Resolved(device(1002, "Probe Device2")))
        );
    }

    #[test]
    fn single_candidate_plural() {
        let selection = select(vec![device(1002, "a")], &request(Cardinality::Many));
        assert_eq!(
            selection,
            Selection::Settled(ResolutionOutcome::ResolvedMany(vec![device(1002, "a")]))
        );
    }

    #[test]
    fn many_candidates_plural_are_ordered() {
        let selection = select(
            vec![device(1005, " b"), device(1003, " a")],
            &request(Cardinality::Many),
        );
        assert_eq!(
            selection,
            Selection::Settled(ResolutionOutcome::ResolvedMany(vec![
                device(1003, "a"),
                device(1005, "b"),
            ]))
        );
    }

    #[test]
    fn many_candidates_singular_is_ambiguous_even_with_matching_hint() {
        let request = request(Cardinality::One).with_name_hint("Probe Device2");
        let selection = select(
            vec![device(1003, "Probe Device3"), device(1002, "Probe Device2")],
            &request,
        );
        assert_eq!(
            selection,
            Selection::Settled(ResolutionOutcome::Ambiguous(vec![
                device(1002, "Probe Device2"),
                device(1003, "Probe Device3"),
            ]))
        );
    }

    #[test]
    fn same_display_name_does_not_merge() {
        let selection = select(
            vec![device(1002, " Ping"), device(1003, "Ping")],
            &request(Cardinality::Many),
        );
        match selection {
            Selection::Settled(ResolutionOutcome::ResolvedMany(records)) => {
                assert_eq!(records.len(), 2);
            }
            other => panic!("unexpected selection: {other:?}"),
        }
    }
}
