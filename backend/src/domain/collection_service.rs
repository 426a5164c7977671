//! Collection lifecycle service.
//!
//! Implements the pickup driving ports: requesting pickups, moving
//! collections through the lifecycle, and the dispatch reads collectors and
//! recyclers work from. Every status write goes through
//! [`LifecycleEngine::plan`] and is applied as a conditional update, so a
//! stale read surfaces as `invalid_transition` rather than overwriting a
//! newer status.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    CollectionCommand, CollectionQuery, CollectionRepository, CollectionRepositoryError,
    CollectionView, PickupRequest, StatusUpdate, TransitionOutcome,
};
use crate::domain::{
    Actor, Collection, CollectionDetails, CollectionId, CollectionStatus, CollectorLocation,
    DispatchRanker, Error, LedgerError, LifecycleEngine, PointsLedger, Ranking, Residue, Role,
    StatusChange, TransitionError, TransitionPlan,
};

/// Points credited to a citizen when their collection is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsAward(u64);

impl PointsAward {
    /// Award used when none is configured.
    pub const DEFAULT: Self = Self(10);

    /// Validate a configured award; zero is rejected.
    pub const fn new(points: u64) -> Result<Self, LedgerError> {
        if points == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        Ok(Self(points))
    }

    /// Award in points.
    #[must_use]
    pub const fn points(self) -> u64 {
        self.0
    }
}

impl Default for PointsAward {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn map_repository_error(error: CollectionRepositoryError) -> Error {
    match error {
        CollectionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("collection repository unavailable: {message}"))
        }
        CollectionRepositoryError::Query { message } => {
            Error::internal(format!("collection repository error: {message}"))
        }
        CollectionRepositoryError::Credit { message } => {
            Error::internal(format!("collection processing credit failed: {message}"))
        }
    }
}

fn map_transition_error(error: TransitionError) -> Error {
    match error {
        TransitionError::InvalidTransition { from, to } => {
            Error::invalid_transition(error.to_string())
                .with_details(json!({ "from": from, "to": to }))
        }
        TransitionError::Unauthorized { from, to, .. } => {
            Error::forbidden(error.to_string()).with_details(json!({ "from": from, "to": to }))
        }
    }
}

fn require_role(actor: Actor, role: Role, action: &str) -> Result<(), Error> {
    if actor.role() == role {
        Ok(())
    } else {
        Err(Error::forbidden(format!("only a {role} may {action}")))
    }
}

/// Domain service implementing [`CollectionCommand`] and [`CollectionQuery`].
#[derive(Clone)]
pub struct CollectionService<R> {
    collection_repo: Arc<R>,
    clock: Arc<dyn Clock>,
    award: PointsAward,
}

impl<R> CollectionService<R> {
    /// Create the service over a collection repository.
    pub fn new(collection_repo: Arc<R>, clock: Arc<dyn Clock>, award: PointsAward) -> Self {
        Self {
            collection_repo,
            clock,
            award,
        }
    }
}

impl<R> CollectionService<R>
where
    R: CollectionRepository,
{
    async fn load(&self, id: CollectionId) -> Result<CollectionDetails, Error> {
        self.collection_repo
            .find_by_id(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("collection {id} not found")))
    }

    async fn store(
        &self,
        collection: &Collection,
        change: &StatusChange,
    ) -> Result<StatusUpdate, Error> {
        if !change.is_processing() {
            return self
                .collection_repo
                .apply_status_change(change)
                .await
                .map_err(map_repository_error);
        }
        let credit = PointsLedger::award_for_collection(
            collection.citizen_id(),
            collection.id(),
            self.award.points(),
            change.at,
        )
        .map_err(|err| Error::internal(format!("cannot build processing credit: {err}")))?;
        self.collection_repo
            .process_and_credit(change, &credit)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<R> CollectionCommand for CollectionService<R>
where
    R: CollectionRepository,
{
    async fn request_pickup(
        &self,
        citizen: Actor,
        request: PickupRequest,
    ) -> Result<CollectionDetails, Error> {
        require_role(citizen, Role::Citizen, "request a pickup")?;
        let now = self.clock.utc();
        let residue = Residue::report(citizen.user_id(), request.residue, now)
            .and_then(Residue::request_pickup)
            .map_err(|err| Error::invalid_request(format!("invalid residue: {err}")))?;
        let collection = Collection::request(&residue, request.location, now);

        self.collection_repo
            .create_pickup(&residue, &collection)
            .await
            .map_err(map_repository_error)?;

        info!(
            collection_id = %collection.id(),
            citizen_id = %citizen.user_id(),
            "pickup requested"
        );
        Ok(CollectionDetails {
            collection,
            residue,
        })
    }

    async fn attempt_transition(
        &self,
        actor: Actor,
        collection_id: CollectionId,
        requested: CollectionStatus,
    ) -> Result<TransitionOutcome, Error> {
        let CollectionDetails { collection, .. } = self.load(collection_id).await?;
        hide_from_other_citizens(actor, &collection)?;
        let plan = LifecycleEngine::plan(&collection, requested, actor, self.clock.utc())
            .map_err(map_transition_error)?;

        let change = match plan {
            TransitionPlan::Unchanged => {
                return Ok(TransitionOutcome {
                    collection,
                    changed: false,
                    points_awarded: None,
                });
            }
            TransitionPlan::Apply(change) => change,
        };

        match self.store(&collection, &change).await? {
            StatusUpdate::Applied(updated) => {
                let points_awarded = change.is_processing().then_some(self.award.points());
                info!(
                    collection_id = %collection_id,
                    from = %change.from,
                    to = %change.to,
                    actor_id = %actor.user_id(),
                    points_awarded,
                    "collection status changed"
                );
                Ok(TransitionOutcome {
                    collection: updated,
                    changed: true,
                    points_awarded,
                })
            }
            StatusUpdate::Stale => {
                warn!(
                    collection_id = %collection_id,
                    from = %change.from,
                    to = %change.to,
                    "collection changed concurrently"
                );
                Err(Error::invalid_transition(format!(
                    "collection {collection_id} is no longer {}",
                    change.from
                ))
                .with_details(json!({ "from": change.from, "to": change.to })))
            }
        }
    }
}

#[async_trait]
impl<R> CollectionQuery for CollectionService<R>
where
    R: CollectionRepository,
{
    async fn rank_open(
        &self,
        collector: Actor,
        location: CollectorLocation,
    ) -> Result<Ranking, Error> {
        require_role(collector, Role::Collector, "browse open pickups")?;
        let open = self
            .collection_repo
            .list_by_status(CollectionStatus::Requested)
            .await
            .map_err(map_repository_error)?;
        let ranking = DispatchRanker::rank_open(open, &location);
        if let Some(warning) = &ranking.warning {
            warn!(collector_id = %collector.user_id(), ?warning, "ranking fell back to time order");
        }
        Ok(ranking)
    }

    async fn active(&self, collector: Actor) -> Result<Vec<Collection>, Error> {
        require_role(collector, Role::Collector, "list held pickups")?;
        let held = self
            .collection_repo
            .list_active_for_collector(&collector.user_id())
            .await
            .map_err(map_repository_error)?;
        Ok(DispatchRanker::active_for(held, collector.user_id()))
    }

    async fn awaiting_processing(&self, recycler: Actor) -> Result<Vec<Collection>, Error> {
        require_role(recycler, Role::Recycler, "list deliveries")?;
        let mut delivered = self
            .collection_repo
            .list_by_status(CollectionStatus::DeliveredToRecycler)
            .await
            .map_err(map_repository_error)?;
        delivered.sort_by_key(Collection::updated_at);
        Ok(delivered)
    }

    async fn my_pickups(&self, citizen: Actor) -> Result<Vec<CollectionDetails>, Error> {
        require_role(citizen, Role::Citizen, "list their pickups")?;
        let mut pickups = self
            .collection_repo
            .list_for_citizen(&citizen.user_id())
            .await
            .map_err(map_repository_error)?;
        pickups.sort_by(|a, b| b.collection.created_at().cmp(&a.collection.created_at()));
        Ok(pickups)
    }

    async fn get(&self, actor: Actor, id: CollectionId) -> Result<CollectionView, Error> {
        let details = self.load(id).await?;
        hide_from_other_citizens(actor, &details.collection)?;
        let allowed_transitions = LifecycleEngine::available_transitions(&details.collection, actor);
        Ok(CollectionView {
            details,
            allowed_transitions,
        })
    }
}

/// Other citizens' pickups read as missing.
fn hide_from_other_citizens(actor: Actor, collection: &Collection) -> Result<(), Error> {
    if actor.role() == Role::Citizen && collection.citizen_id() != actor.user_id() {
        return Err(Error::not_found(format!(
            "collection {} not found",
            collection.id()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "collection_service_tests.rs"]
mod tests;
