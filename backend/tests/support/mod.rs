//! Shared wiring for service-level integration tests.
//!
//! Every service runs over one [`InMemoryStore`] with the system clock, the
//! same arrangement the server uses when no database is configured.

use std::sync::Arc;

use mockable::DefaultClock;
use reciclai::domain::ports::{AccountCommand, CollectionCommand, PickupRequest};
use reciclai::domain::{
    AccountService, Actor, CollectionDetails, CollectionId, CollectionService, CollectionStatus,
    Coordinate, PointsAward, RegistrationDraft, ResidueDraft, RewardsService, Role,
};
use reciclai::outbound::memory::InMemoryStore;

/// Services sharing one store.
pub struct World {
    pub accounts: AccountService<InMemoryStore>,
    pub collections: CollectionService<InMemoryStore>,
    pub rewards: RewardsService<InMemoryStore>,
}

impl World {
    pub fn new() -> Self {
        Self::with_award(PointsAward::default())
    }

    pub fn with_award(award: PointsAward) -> Self {
        Self::over(Arc::new(InMemoryStore::new()), award)
    }

    pub fn over(store: Arc<InMemoryStore>, award: PointsAward) -> Self {
        let clock = Arc::new(DefaultClock);
        Self {
            accounts: AccountService::new(store.clone(), clock.clone()),
            collections: CollectionService::new(store.clone(), clock.clone(), award),
            rewards: RewardsService::new(store, clock),
        }
    }

    /// Register `username` with `role` and return the acting identity.
    pub async fn register(&self, username: &str, role: Role) -> Actor {
        let draft = RegistrationDraft {
            username: username.to_owned(),
            role,
            document: None,
            phone: None,
        };
        self.accounts
            .register(draft)
            .await
            .expect("registration succeeds")
            .profile()
            .actor()
    }

    /// Request a pickup of ten units at `(latitude, longitude)`.
    pub async fn request_pickup(
        &self,
        citizen: Actor,
        latitude: f64,
        longitude: f64,
    ) -> CollectionDetails {
        let request = PickupRequest {
            residue: ResidueDraft {
                residue_type: "plastic".to_owned(),
                weight_kg: None,
                units: Some(10),
                notes: None,
            },
            location: Coordinate::new(latitude, longitude).expect("valid coordinate"),
        };
        self.collections
            .request_pickup(citizen, request)
            .await
            .expect("pickup accepted")
    }

    /// Drive `id` from `Requested` to `DeliveredToRecycler` as `collector`.
    pub async fn deliver(&self, collector: Actor, id: CollectionId) {
        for status in [
            CollectionStatus::Assigned,
            CollectionStatus::EnRoute,
            CollectionStatus::Collected,
            CollectionStatus::DeliveredToRecycler,
        ] {
            self.collections
                .attempt_transition(collector, id, status)
                .await
                .expect("collector advances the collection");
        }
    }

    /// Request, deliver and process one pickup, crediting `citizen`.
    pub async fn complete_pickup(&self, citizen: Actor, collector: Actor, recycler: Actor) {
        let details = self.request_pickup(citizen, -5.1136, -42.8487).await;
        let id = details.collection.id();
        self.deliver(collector, id).await;
        self.collections
            .attempt_transition(recycler, id, CollectionStatus::Processed)
            .await
            .expect("recycler processes the delivery");
    }
}
