//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: a mutex-guarded store for running without a database
//!
//! Adapters are thin translators that convert between domain types and
//! storage representations. They contain no business logic.

pub mod memory;
pub mod persistence;
