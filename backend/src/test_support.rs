//! Shared helpers for unit tests in `src/`.
//!
//! Only compiled under `cfg(test)`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Actor, Collection, CollectionDetails, CollectionStatus, Coordinate, Residue, ResidueDraft,
    Role, StatusChange, UserId,
};

/// Fixed instant every fixture clock reports.
pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 15, 14, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// A clock frozen at [`fixture_timestamp`].
pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

/// A fresh actor with `role`.
pub fn actor(role: Role) -> Actor {
    Actor::new(UserId::random(), role)
}

/// Ten PET bottles, the way the mobile form sends them.
pub fn residue_draft() -> ResidueDraft {
    ResidueDraft {
        residue_type: "Garrafa PET".to_owned(),
        weight_kg: None,
        units: Some(10),
        notes: None,
    }
}

/// A collection owned by `citizen`, walked to `status`.
///
/// Collector-held statuses are assigned to `collector`.
pub fn collection_in(
    citizen: Actor,
    collector: Actor,
    status: CollectionStatus,
) -> CollectionDetails {
    let created = fixture_timestamp() - Duration::hours(3);
    let residue = Residue::report(citizen.user_id(), residue_draft(), created)
        .and_then(Residue::request_pickup)
        .expect("valid residue");
    let location = Coordinate::new(-5.1136, -42.8487).expect("valid coordinate");
    let mut collection = Collection::request(&residue, location, created);

    let path: &[CollectionStatus] = match status {
        CollectionStatus::Requested => &[],
        CollectionStatus::Assigned => &[CollectionStatus::Assigned],
        CollectionStatus::EnRoute => &[CollectionStatus::Assigned, CollectionStatus::EnRoute],
        CollectionStatus::Collected => &[
            CollectionStatus::Assigned,
            CollectionStatus::EnRoute,
            CollectionStatus::Collected,
        ],
        CollectionStatus::DeliveredToRecycler => &[
            CollectionStatus::Assigned,
            CollectionStatus::EnRoute,
            CollectionStatus::Collected,
            CollectionStatus::DeliveredToRecycler,
        ],
        CollectionStatus::Processed => &[
            CollectionStatus::Assigned,
            CollectionStatus::EnRoute,
            CollectionStatus::Collected,
            CollectionStatus::DeliveredToRecycler,
            CollectionStatus::Processed,
        ],
        CollectionStatus::Cancelled => &[CollectionStatus::Assigned, CollectionStatus::Cancelled],
    };
    for (step, to) in path.iter().enumerate() {
        let minutes = i64::try_from(step).expect("short path") + 1;
        let change = StatusChange {
            collection_id: collection.id(),
            from: collection.status(),
            to: *to,
            expected_collector: collection.collector_id(),
            collector: Some(collector.user_id()),
            at: created + Duration::minutes(minutes),
        };
        collection = collection.apply(&change);
    }
    let residue = if status == CollectionStatus::Processed {
        residue.finalize()
    } else {
        residue
    };
    CollectionDetails {
        collection,
        residue,
    }
}

pub mod openapi {
    //! OpenAPI schema traversal helpers.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic otherwise.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => panic!(
                "schema '{name}' is a $ref to '{}'; resolve the reference first",
                reference.ref_location
            ),
            _ => panic!("schema '{name}' is not an Object"),
        }
    }
}
