//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, AccountQuery, CollectionCommand, CollectionQuery, RewardsCommand,
    RewardsQuery,
};
use crate::domain::{Account, Actor, Error, ErrorCode};

use super::session::SessionContext;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub collections: Arc<dyn CollectionCommand>,
    pub collections_query: Arc<dyn CollectionQuery>,
    pub rewards: Arc<dyn RewardsCommand>,
    pub rewards_query: Arc<dyn RewardsQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub collections: Arc<dyn CollectionCommand>,
    pub collections_query: Arc<dyn CollectionQuery>,
    pub rewards: Arc<dyn RewardsCommand>,
    pub rewards_query: Arc<dyn RewardsQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use reciclai::domain::{AccountService, CollectionService, PointsAward, RewardsService};
    /// use reciclai::inbound::http::state::{HttpState, HttpStatePorts};
    /// use reciclai::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let clock = Arc::new(DefaultClock);
    /// let accounts = Arc::new(AccountService::new(store.clone(), clock.clone()));
    /// let collections = Arc::new(CollectionService::new(
    ///     store.clone(),
    ///     clock.clone(),
    ///     PointsAward::default(),
    /// ));
    /// let rewards = Arc::new(RewardsService::new(store, clock));
    /// let state = HttpState::new(HttpStatePorts {
    ///     accounts: accounts.clone(),
    ///     accounts_query: accounts,
    ///     collections: collections.clone(),
    ///     collections_query: collections,
    ///     rewards: rewards.clone(),
    ///     rewards_query: rewards,
    /// });
    /// let _rewards = state.rewards_query.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            accounts_query,
            collections,
            collections_query,
            rewards,
            rewards_query,
        } = ports;
        Self {
            accounts,
            accounts_query,
            collections,
            collections_query,
            rewards,
            rewards_query,
        }
    }

    /// Load the signed-in user's account.
    ///
    /// A session naming an account that no longer exists is cleared and
    /// treated as signed out.
    pub async fn account(&self, session: &SessionContext) -> Result<Account, Error> {
        let user_id = session.require_user_id()?;
        match self.accounts_query.account(&user_id).await {
            Ok(account) => Ok(account),
            Err(error) if error.code() == ErrorCode::NotFound => {
                session.clear();
                Err(Error::unauthorized("login required"))
            }
            Err(error) => Err(error),
        }
    }

    /// Resolve the signed-in user to an [`Actor`] carrying their role.
    pub async fn actor(&self, session: &SessionContext) -> Result<Actor, Error> {
        self.account(session)
            .await
            .map(|account| account.profile().actor())
    }
}
