//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the account, collection and ledger
//! repository ports, backed by PostgreSQL through `diesel-async` and `bb8`
//! connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Lifecycle and ledger rules stay in the domain.
//! - **Conditional writes**: status changes and debits are guarded updates,
//!   so concurrent requests serialise on the row instead of on the process.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//!
//! # Example
//!
//! ```ignore
//! use reciclai::outbound::persistence::{DbPool, DieselCollectionRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/reciclai")).await?;
//! let repo = DieselCollectionRepository::new(pool);
//! ```

mod diesel_account_repository;
mod diesel_basic_error_mapping;
mod diesel_collection_repository;
mod diesel_ledger_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_collection_repository::DieselCollectionRepository;
pub use diesel_ledger_repository::DieselLedgerRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
