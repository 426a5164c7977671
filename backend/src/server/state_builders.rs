//! Builders for HTTP state ports over the configured storage.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use reciclai::domain::ports::{AccountRepository, CollectionRepository, LedgerRepository};
use reciclai::domain::{AccountService, CollectionService, PointsAward, RewardsService};
use reciclai::inbound::http::state::{HttpState, HttpStatePorts};
use reciclai::outbound::memory::InMemoryStore;
use reciclai::outbound::persistence::{
    DieselAccountRepository, DieselCollectionRepository, DieselLedgerRepository,
};

use super::ServerConfig;

/// Wire the account, collection and rewards services over one repository
/// per concern.
fn build_ports<A, C, L>(
    accounts_repo: Arc<A>,
    collections_repo: Arc<C>,
    ledger_repo: Arc<L>,
    award: PointsAward,
    clock: Arc<dyn Clock>,
) -> HttpStatePorts
where
    A: AccountRepository + 'static,
    C: CollectionRepository + 'static,
    L: LedgerRepository + 'static,
{
    let accounts = Arc::new(AccountService::new(accounts_repo, clock.clone()));
    let collections = Arc::new(CollectionService::new(collections_repo, clock.clone(), award));
    let rewards = Arc::new(RewardsService::new(ledger_repo, clock));

    HttpStatePorts {
        accounts: accounts.clone(),
        accounts_query: accounts,
        collections: collections.clone(),
        collections_query: collections,
        rewards: rewards.clone(),
        rewards_query: rewards,
    }
}

/// Build the shared HTTP state.
///
/// A configured pool selects the Diesel adapters; otherwise one
/// [`InMemoryStore`] backs every port so accounts, collections and the
/// ledger stay consistent with each other.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ports = match &config.db_pool {
        Some(pool) => build_ports(
            Arc::new(DieselAccountRepository::new(pool.clone())),
            Arc::new(DieselCollectionRepository::new(pool.clone())),
            Arc::new(DieselLedgerRepository::new(pool.clone())),
            config.award,
            clock,
        ),
        None => {
            let store = Arc::new(InMemoryStore::new());
            build_ports(store.clone(), store.clone(), store, config.award, clock)
        }
    };

    web::Data::new(HttpState::new(ports))
}
