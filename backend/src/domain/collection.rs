//! Pickup tasks and their status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Coordinate, Residue, ResidueId, UserId};

/// Collection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(Uuid);

impl CollectionId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage or a request path.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Raised when a status label is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collection status: {0}")]
pub struct UnknownCollectionStatus(pub String);

/// Where a pickup is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Requested,
    Assigned,
    EnRoute,
    Collected,
    DeliveredToRecycler,
    Processed,
    Cancelled,
}

impl CollectionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Requested,
        Self::Assigned,
        Self::EnRoute,
        Self::Collected,
        Self::DeliveredToRecycler,
        Self::Processed,
        Self::Cancelled,
    ];

    /// Statuses in which a collector holds the pickup.
    pub const ACTIVE: [Self; 3] = [Self::Assigned, Self::EnRoute, Self::Collected];

    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Assigned => "assigned",
            Self::EnRoute => "en_route",
            Self::Collected => "collected",
            Self::DeliveredToRecycler => "delivered_to_recycler",
            Self::Processed => "processed",
            Self::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Processed | Self::Cancelled)
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionStatus {
    type Err = UnknownCollectionStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownCollectionStatus(raw.to_owned()))
    }
}

/// A validated status move, produced by the lifecycle engine.
///
/// Adapters apply it as a conditional update: the row must still be in
/// `from` with `expected_collector`, otherwise the change is stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusChange {
    pub collection_id: CollectionId,
    pub from: CollectionStatus,
    pub to: CollectionStatus,
    pub expected_collector: Option<UserId>,
    pub collector: Option<UserId>,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    /// Whether this change completes the lifecycle and earns points.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.to == CollectionStatus::Processed
    }
}

/// Stored collection fields, used by adapters to rebuild a [`Collection`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRecord {
    pub id: CollectionId,
    pub residue_id: ResidueId,
    pub citizen_id: UserId,
    pub collector_id: Option<UserId>,
    pub status: CollectionStatus,
    pub location: Coordinate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A pickup task tied to exactly one residue.
///
/// The citizen is denormalised from the residue so ledger credits and
/// per-citizen listings need no join.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    id: CollectionId,
    residue_id: ResidueId,
    citizen_id: UserId,
    collector_id: Option<UserId>,
    status: CollectionStatus,
    location: Coordinate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl Collection {
    /// Open a new pickup request for `residue` at `location`.
    #[must_use]
    pub fn request(residue: &Residue, location: Coordinate, now: DateTime<Utc>) -> Self {
        Self {
            id: CollectionId::random(),
            residue_id: residue.id(),
            citizen_id: residue.citizen_id(),
            collector_id: None,
            status: CollectionStatus::Requested,
            location,
            created_at: now,
            updated_at: now,
            processed_at: None,
        }
    }

    /// Apply a status change planned against this collection.
    #[must_use]
    pub fn apply(self, change: &StatusChange) -> Self {
        Self {
            status: change.to,
            collector_id: change.collector,
            updated_at: change.at,
            processed_at: if change.is_processing() {
                Some(change.at)
            } else {
                self.processed_at
            },
            ..self
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> CollectionId {
        self.id
    }

    /// Residue being collected.
    #[must_use]
    pub const fn residue_id(&self) -> ResidueId {
        self.residue_id
    }

    /// Citizen who requested the pickup.
    #[must_use]
    pub const fn citizen_id(&self) -> UserId {
        self.citizen_id
    }

    /// Collector holding the pickup, once assigned.
    #[must_use]
    pub const fn collector_id(&self) -> Option<UserId> {
        self.collector_id
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> CollectionStatus {
        self.status
    }

    /// Pickup location.
    #[must_use]
    pub const fn location(&self) -> Coordinate {
        self.location
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last status change.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// When a recycler processed it.
    #[must_use]
    pub const fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }
}

impl From<CollectionRecord> for Collection {
    fn from(record: CollectionRecord) -> Self {
        Self {
            id: record.id,
            residue_id: record.residue_id,
            citizen_id: record.citizen_id,
            collector_id: record.collector_id,
            status: record.status,
            location: record.location,
            created_at: record.created_at,
            updated_at: record.updated_at,
            processed_at: record.processed_at,
        }
    }
}

/// A collection together with the residue it picks up.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDetails {
    pub collection: Collection,
    pub residue: Residue,
}
