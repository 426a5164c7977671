//! Collection lifecycle state machine.
//!
//! The engine is pure: it validates a requested status against the
//! transition table and the acting identity, and returns the
//! [`StatusChange`] an adapter must apply atomically. It never touches
//! storage.
//!
//! ```text
//! requested -> assigned -> en_route -> collected -> delivered_to_recycler -> processed
//!                  \-> cancelled
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Actor, Collection, CollectionStatus, Role, StatusChange};

/// Who may traverse an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRequirement {
    /// Any collector; they become the collection's collector.
    AnyCollector,
    /// Only the collector already holding the collection.
    AssignedCollector,
    /// Any recycler.
    AnyRecycler,
}

impl fmt::Display for ActorRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AnyCollector => "a collector",
            Self::AssignedCollector => "the assigned collector",
            Self::AnyRecycler => "a recycler",
        })
    }
}

/// Rejections produced by [`LifecycleEngine::plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot move collection from {from} to {to}")]
    InvalidTransition {
        from: CollectionStatus,
        to: CollectionStatus,
    },
    #[error("only {requirement} may move a collection from {from} to {to}")]
    Unauthorized {
        from: CollectionStatus,
        to: CollectionStatus,
        requirement: ActorRequirement,
    },
}

/// Result of planning a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionPlan {
    /// The requested status is the current one; nothing to write.
    Unchanged,
    /// Apply this change.
    Apply(StatusChange),
}

/// The transition table and its actor rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleEngine;

impl LifecycleEngine {
    /// Statuses reachable from `current`, regardless of actor.
    ///
    /// # Examples
    /// ```
    /// use reciclai::domain::{CollectionStatus, LifecycleEngine};
    ///
    /// assert_eq!(
    ///     LifecycleEngine::allowed_next(CollectionStatus::Assigned),
    ///     &[CollectionStatus::EnRoute, CollectionStatus::Cancelled]
    /// );
    /// assert!(LifecycleEngine::allowed_next(CollectionStatus::Processed).is_empty());
    /// ```
    #[must_use]
    pub const fn allowed_next(current: CollectionStatus) -> &'static [CollectionStatus] {
        use CollectionStatus as S;
        match current {
            S::Requested => &[S::Assigned],
            S::Assigned => &[S::EnRoute, S::Cancelled],
            S::EnRoute => &[S::Collected],
            S::Collected => &[S::DeliveredToRecycler],
            S::DeliveredToRecycler => &[S::Processed],
            S::Processed | S::Cancelled => &[],
        }
    }

    /// Actor rule for leaving `current`. Every edge out of a status shares it.
    #[must_use]
    pub const fn requirement(current: CollectionStatus) -> Option<ActorRequirement> {
        use CollectionStatus as S;
        match current {
            S::Requested => Some(ActorRequirement::AnyCollector),
            S::Assigned | S::EnRoute | S::Collected => Some(ActorRequirement::AssignedCollector),
            S::DeliveredToRecycler => Some(ActorRequirement::AnyRecycler),
            S::Processed | S::Cancelled => None,
        }
    }

    /// Validate `requested` for `collection` on behalf of `actor`.
    ///
    /// Re-submitting the current status succeeds as
    /// [`TransitionPlan::Unchanged`], except that a claim on a collection
    /// someone else already holds is an invalid transition. Otherwise the
    /// allowed set is checked before the actor.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use reciclai::domain::{
    ///     Actor, Collection, CollectionStatus, Coordinate, LifecycleEngine, Residue,
    ///     ResidueDraft, Role, TransitionPlan, UserId,
    /// };
    ///
    /// let residue = Residue::report(
    ///     UserId::random(),
    ///     ResidueDraft {
    ///         residue_type: "Vidro".to_owned(),
    ///         weight_kg: Some(2.0),
    ///         units: None,
    ///         notes: None,
    ///     },
    ///     Utc::now(),
    /// )
    /// .expect("valid residue");
    /// let here = Coordinate::new(-5.1, -42.8).expect("valid coordinate");
    /// let collection = Collection::request(&residue, here, Utc::now());
    /// let collector = Actor::new(UserId::random(), Role::Collector);
    ///
    /// let plan = LifecycleEngine::plan(&collection, CollectionStatus::Assigned, collector, Utc::now())
    ///     .expect("collectors may claim open pickups");
    /// let TransitionPlan::Apply(change) = plan else { panic!("expected a change") };
    /// assert_eq!(change.collector, Some(collector.user_id()));
    /// ```
    pub fn plan(
        collection: &Collection,
        requested: CollectionStatus,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<TransitionPlan, TransitionError> {
        let from = collection.status();
        let invalid = TransitionError::InvalidTransition {
            from,
            to: requested,
        };
        if requested == from {
            if Self::is_lost_claim(collection, requested, actor) {
                return Err(invalid);
            }
            return Ok(TransitionPlan::Unchanged);
        }
        if !Self::allowed_next(from).contains(&requested) {
            return Err(invalid);
        }
        let requirement = Self::requirement(from).ok_or(invalid)?;
        if !Self::satisfies(collection, actor, requirement) {
            return Err(TransitionError::Unauthorized {
                from,
                to: requested,
                requirement,
            });
        }

        let collector = match requirement {
            ActorRequirement::AnyCollector => Some(actor.user_id()),
            ActorRequirement::AssignedCollector | ActorRequirement::AnyRecycler => {
                collection.collector_id()
            }
        };
        Ok(TransitionPlan::Apply(StatusChange {
            collection_id: collection.id(),
            from,
            to: requested,
            expected_collector: collection.collector_id(),
            collector,
            at: now,
        }))
    }

    /// Statuses `actor` may request next for `collection`, excluding the
    /// current one.
    #[must_use]
    pub fn available_transitions(collection: &Collection, actor: Actor) -> Vec<CollectionStatus> {
        let from = collection.status();
        match Self::requirement(from) {
            Some(requirement) if Self::satisfies(collection, actor, requirement) => {
                Self::allowed_next(from).to_vec()
            }
            _ => Vec::new(),
        }
    }

    /// A claim on a collection already assigned to another user.
    fn is_lost_claim(collection: &Collection, requested: CollectionStatus, actor: Actor) -> bool {
        requested == CollectionStatus::Assigned
            && collection.collector_id() != Some(actor.user_id())
    }

    fn satisfies(collection: &Collection, actor: Actor, requirement: ActorRequirement) -> bool {
        match requirement {
            ActorRequirement::AnyCollector => {
                actor.role() == Role::Collector && collection.collector_id().is_none()
            }
            ActorRequirement::AssignedCollector => {
                actor.role() == Role::Collector
                    && collection.collector_id() == Some(actor.user_id())
            }
            ActorRequirement::AnyRecycler => actor.role() == Role::Recycler,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{Coordinate, Residue, ResidueDraft, UserId};

    struct Cast {
        collector: Actor,
        other_collector: Actor,
        recycler: Actor,
        citizen: Actor,
    }

    #[fixture]
    fn cast() -> Cast {
        Cast {
            collector: Actor::new(UserId::random(), Role::Collector),
            other_collector: Actor::new(UserId::random(), Role::Collector),
            recycler: Actor::new(UserId::random(), Role::Recycler),
            citizen: Actor::new(UserId::random(), Role::Citizen),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn open_collection(citizen: Actor) -> Collection {
        let residue = Residue::report(
            citizen.user_id(),
            ResidueDraft {
                residue_type: "Latinhas".to_owned(),
                weight_kg: None,
                units: Some(40),
                notes: None,
            },
            now(),
        )
        .expect("valid residue");
        Collection::request(
            &residue,
            Coordinate::new(-23.55, -46.63).expect("valid"),
            now(),
        )
    }

    fn advance(collection: Collection, to: CollectionStatus, actor: Actor) -> Collection {
        match LifecycleEngine::plan(&collection, to, actor, now() + Duration::minutes(5))
            .expect("transition allowed")
        {
            TransitionPlan::Apply(change) => collection.apply(&change),
            TransitionPlan::Unchanged => collection,
        }
    }

    fn in_status(cast: &Cast, status: CollectionStatus) -> Collection {
        use CollectionStatus as S;
        let mut collection = open_collection(cast.citizen);
        let path: &[S] = match status {
            S::Requested => &[],
            S::Assigned => &[S::Assigned],
            S::EnRoute => &[S::Assigned, S::EnRoute],
            S::Collected => &[S::Assigned, S::EnRoute, S::Collected],
            S::DeliveredToRecycler => &[S::Assigned, S::EnRoute, S::Collected, S::DeliveredToRecycler],
            S::Processed => &[
                S::Assigned,
                S::EnRoute,
                S::Collected,
                S::DeliveredToRecycler,
                S::Processed,
            ],
            S::Cancelled => &[S::Assigned, S::Cancelled],
        };
        for step in path {
            let actor = if *step == S::Processed {
                cast.recycler
            } else {
                cast.collector
            };
            collection = advance(collection, *step, actor);
        }
        collection
    }

    #[rstest]
    fn assignment_sets_collector_with_status(cast: Cast) {
        let collection = open_collection(cast.citizen);
        let plan = LifecycleEngine::plan(&collection, CollectionStatus::Assigned, cast.collector, now())
            .expect("allowed");
        let TransitionPlan::Apply(change) = plan else {
            panic!("expected a change");
        };
        assert_eq!(change.expected_collector, None);
        assert_eq!(change.collector, Some(cast.collector.user_id()));
        assert_eq!(change.from, CollectionStatus::Requested);
    }

    #[rstest]
    fn happy_path_reaches_processed(cast: Cast) {
        let collection = in_status(&cast, CollectionStatus::Processed);
        assert_eq!(collection.status(), CollectionStatus::Processed);
        assert_eq!(collection.collector_id(), Some(cast.collector.user_id()));
        assert!(collection.processed_at().is_some());
    }

    #[rstest]
    fn resubmitting_current_status_is_a_no_op_everywhere(cast: Cast) {
        for status in CollectionStatus::ALL {
            let collection = in_status(&cast, status);
            for actor in [cast.citizen, cast.collector, cast.other_collector, cast.recycler] {
                if status == CollectionStatus::Assigned && actor != cast.collector {
                    continue;
                }
                assert_eq!(
                    LifecycleEngine::plan(&collection, status, actor, now()),
                    Ok(TransitionPlan::Unchanged),
                    "{status} resubmitted by {:?}",
                    actor.role()
                );
            }
        }
    }

    #[rstest]
    fn claiming_a_held_collection_is_invalid(cast: Cast) {
        let collection = in_status(&cast, CollectionStatus::Assigned);
        for actor in [cast.other_collector, cast.citizen, cast.recycler] {
            assert_eq!(
                LifecycleEngine::plan(&collection, CollectionStatus::Assigned, actor, now()),
                Err(TransitionError::InvalidTransition {
                    from: CollectionStatus::Assigned,
                    to: CollectionStatus::Assigned,
                })
            );
        }
        assert_eq!(
            LifecycleEngine::plan(&collection, CollectionStatus::Assigned, cast.collector, now()),
            Ok(TransitionPlan::Unchanged)
        );
    }

    #[rstest]
    fn unlisted_edges_are_invalid_for_every_actor(cast: Cast) {
        for from in CollectionStatus::ALL {
            let collection = in_status(&cast, from);
            for to in CollectionStatus::ALL {
                if to == from || LifecycleEngine::allowed_next(from).contains(&to) {
                    continue;
                }
                for actor in [cast.citizen, cast.collector, cast.recycler] {
                    assert_eq!(
                        LifecycleEngine::plan(&collection, to, actor, now()),
                        Err(TransitionError::InvalidTransition { from, to })
                    );
                }
            }
        }
    }

    #[rstest]
    #[case(CollectionStatus::Requested, CollectionStatus::Assigned)]
    #[case(CollectionStatus::Assigned, CollectionStatus::EnRoute)]
    #[case(CollectionStatus::Assigned, CollectionStatus::Cancelled)]
    #[case(CollectionStatus::EnRoute, CollectionStatus::Collected)]
    #[case(CollectionStatus::Collected, CollectionStatus::DeliveredToRecycler)]
    #[case(CollectionStatus::DeliveredToRecycler, CollectionStatus::Processed)]
    fn citizens_cannot_drive_any_edge(
        cast: Cast,
        #[case] from: CollectionStatus,
        #[case] to: CollectionStatus,
    ) {
        let collection = in_status(&cast, from);
        assert!(matches!(
            LifecycleEngine::plan(&collection, to, cast.citizen, now()),
            Err(TransitionError::Unauthorized { .. })
        ));
    }

    #[rstest]
    #[case(CollectionStatus::Assigned, CollectionStatus::EnRoute)]
    #[case(CollectionStatus::Assigned, CollectionStatus::Cancelled)]
    #[case(CollectionStatus::EnRoute, CollectionStatus::Collected)]
    #[case(CollectionStatus::Collected, CollectionStatus::DeliveredToRecycler)]
    fn only_the_assigned_collector_moves_held_pickups(
        cast: Cast,
        #[case] from: CollectionStatus,
        #[case] to: CollectionStatus,
    ) {
        let collection = in_status(&cast, from);
        assert_eq!(
            LifecycleEngine::plan(&collection, to, cast.other_collector, now()),
            Err(TransitionError::Unauthorized {
                from,
                to,
                requirement: ActorRequirement::AssignedCollector,
            })
        );
        assert!(LifecycleEngine::plan(&collection, to, cast.collector, now()).is_ok());
    }

    #[rstest]
    fn collectors_cannot_process(cast: Cast) {
        let collection = in_status(&cast, CollectionStatus::DeliveredToRecycler);
        assert_eq!(
            LifecycleEngine::plan(&collection, CollectionStatus::Processed, cast.collector, now()),
            Err(TransitionError::Unauthorized {
                from: CollectionStatus::DeliveredToRecycler,
                to: CollectionStatus::Processed,
                requirement: ActorRequirement::AnyRecycler,
            })
        );
    }

    #[rstest]
    fn processing_keeps_the_collector(cast: Cast) {
        let collection = in_status(&cast, CollectionStatus::DeliveredToRecycler);
        let Ok(TransitionPlan::Apply(change)) =
            LifecycleEngine::plan(&collection, CollectionStatus::Processed, cast.recycler, now())
        else {
            panic!("recycler may process");
        };
        assert!(change.is_processing());
        assert_eq!(change.collector, Some(cast.collector.user_id()));
        assert_eq!(change.expected_collector, Some(cast.collector.user_id()));
    }

    #[rstest]
    fn available_transitions_follow_actor(cast: Cast) {
        let assigned = in_status(&cast, CollectionStatus::Assigned);
        assert_eq!(
            LifecycleEngine::available_transitions(&assigned, cast.collector),
            vec![CollectionStatus::EnRoute, CollectionStatus::Cancelled]
        );
        assert!(LifecycleEngine::available_transitions(&assigned, cast.other_collector).is_empty());
        assert!(LifecycleEngine::available_transitions(&assigned, cast.recycler).is_empty());

        let delivered = in_status(&cast, CollectionStatus::DeliveredToRecycler);
        assert_eq!(
            LifecycleEngine::available_transitions(&delivered, cast.recycler),
            vec![CollectionStatus::Processed]
        );

        let processed = in_status(&cast, CollectionStatus::Processed);
        assert!(LifecycleEngine::available_transitions(&processed, cast.recycler).is_empty());
    }
}
