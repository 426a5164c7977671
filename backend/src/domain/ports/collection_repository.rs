//! Port for residue and collection persistence.
//!
//! Status writes are conditional: adapters apply a [`StatusChange`] only if
//! the stored row still has the expected status and collector, and report
//! [`StatusUpdate::Stale`] otherwise. This is what serialises concurrent
//! claims on the same pickup.

use async_trait::async_trait;

use crate::domain::{
    Collection, CollectionDetails, CollectionId, CollectionStatus, PointsTransaction, Residue,
    StatusChange, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by collection repository adapters.
    pub enum CollectionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "collection repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "collection repository query failed: {message}",
        /// The credit attached to a processing change could not be posted.
        Credit { message: String } => "processing credit failed: {message}",
    }
}

/// Outcome of a conditional status write.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// The change was stored; the updated collection is returned.
    Applied(Collection),
    /// The stored row no longer matched; nothing was written.
    Stale,
}

/// Port for reading and writing pickups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    /// Store a residue and its collection together.
    async fn create_pickup(
        &self,
        residue: &Residue,
        collection: &Collection,
    ) -> Result<(), CollectionRepositoryError>;

    /// Load a collection with its residue.
    async fn find_by_id(
        &self,
        id: &CollectionId,
    ) -> Result<Option<CollectionDetails>, CollectionRepositoryError>;

    /// Collections currently in `status`.
    async fn list_by_status(
        &self,
        status: CollectionStatus,
    ) -> Result<Vec<Collection>, CollectionRepositoryError>;

    /// Collections held by `collector` in an active status.
    async fn list_active_for_collector(
        &self,
        collector: &UserId,
    ) -> Result<Vec<Collection>, CollectionRepositoryError>;

    /// Every pickup requested by `citizen`, with residues.
    async fn list_for_citizen(
        &self,
        citizen: &UserId,
    ) -> Result<Vec<CollectionDetails>, CollectionRepositoryError>;

    /// Conditionally apply a status change that earns no points.
    async fn apply_status_change(
        &self,
        change: &StatusChange,
    ) -> Result<StatusUpdate, CollectionRepositoryError>;

    /// Conditionally apply a processing change, finalise the residue and post
    /// `credit`, all or nothing.
    async fn process_and_credit(
        &self,
        change: &StatusChange,
        credit: &PointsTransaction,
    ) -> Result<StatusUpdate, CollectionRepositoryError>;
}
