//! Driving port for collection reads.

use async_trait::async_trait;

use crate::domain::{
    Actor, Collection, CollectionDetails, CollectionId, CollectionStatus, CollectorLocation,
    Error, Ranking,
};

/// A collection as seen by one actor.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionView {
    pub details: CollectionDetails,
    /// Statuses the actor may request next.
    pub allowed_transitions: Vec<CollectionStatus>,
}

/// Driving port for collection reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionQuery: Send + Sync {
    /// Open pickups for a collector, nearest or oldest first.
    async fn rank_open(&self, collector: Actor, location: CollectorLocation)
    -> Result<Ranking, Error>;

    /// Pickups the collector currently holds, most recently updated first.
    async fn active(&self, collector: Actor) -> Result<Vec<Collection>, Error>;

    /// Deliveries waiting for a recycler, oldest update first.
    async fn awaiting_processing(&self, recycler: Actor) -> Result<Vec<Collection>, Error>;

    /// The citizen's own pickups, newest first.
    async fn my_pickups(&self, citizen: Actor) -> Result<Vec<CollectionDetails>, Error>;

    /// One collection with the transitions open to `actor`.
    async fn get(&self, actor: Actor, id: CollectionId) -> Result<CollectionView, Error>;
}
