//! Driving port for pickup requests and status transitions.

use async_trait::async_trait;

use crate::domain::{
    Actor, Collection, CollectionDetails, CollectionId, CollectionStatus, Coordinate, Error,
    ResidueDraft,
};

/// A citizen's pickup request.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupRequest {
    pub residue: ResidueDraft,
    pub location: Coordinate,
}

/// Result of [`CollectionCommand::attempt_transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// The collection after the call.
    pub collection: Collection,
    /// `false` when the requested status was already current.
    pub changed: bool,
    /// Points credited to the citizen, when the change processed it.
    pub points_awarded: Option<u64>,
}

/// Driving port for collection writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionCommand: Send + Sync {
    /// Register a residue and open its collection in `requested`.
    async fn request_pickup(
        &self,
        citizen: Actor,
        request: PickupRequest,
    ) -> Result<CollectionDetails, Error>;

    /// Move a collection to `requested` on behalf of `actor`.
    ///
    /// Fails with `invalid_transition` for edges outside the table (and for
    /// the loser of a concurrent claim), `forbidden` when the actor may not
    /// take the edge, and `not_found` for unknown collections.
    async fn attempt_transition(
        &self,
        actor: Actor,
        collection_id: CollectionId,
        requested: CollectionStatus,
    ) -> Result<TransitionOutcome, Error>;
}
