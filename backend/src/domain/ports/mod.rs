//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (`*Repository`) describe what the domain needs from storage;
//! each exposes a typed error enum so adapters map their failures into
//! predictable variants. Driving ports (`*Command`, `*Query`) are what inbound
//! adapters call; domain services implement them and speak
//! [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_query;
mod account_repository;
mod collection_command;
mod collection_query;
mod collection_repository;
mod ledger_repository;
mod rewards_command;
mod rewards_query;

pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_query::AccountQuery;
#[cfg(test)]
pub use account_query::MockAccountQuery;
#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError};
#[cfg(test)]
pub use collection_command::MockCollectionCommand;
pub use collection_command::{CollectionCommand, PickupRequest, TransitionOutcome};
#[cfg(test)]
pub use collection_query::MockCollectionQuery;
pub use collection_query::{CollectionQuery, CollectionView};
#[cfg(test)]
pub use collection_repository::MockCollectionRepository;
pub use collection_repository::{CollectionRepository, CollectionRepositoryError, StatusUpdate};
#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
pub use ledger_repository::{LedgerRepository, LedgerRepositoryError};
#[cfg(test)]
pub use rewards_command::MockRewardsCommand;
pub use rewards_command::{RedemptionReceipt, RewardsCommand};
#[cfg(test)]
pub use rewards_query::MockRewardsQuery;
pub use rewards_query::RewardsQuery;
