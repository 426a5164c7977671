//! Port for account persistence.
//!
//! A user and its profile are written in one atomic unit; adapters never
//! expose a way to store one without the other.

use async_trait::async_trait;

use crate::domain::{Account, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// Another account already uses the username.
        UsernameTaken { username: String } => "username {username} is already registered",
        /// Another account already uses the CPF/CNPJ document.
        DocumentTaken => "document is already registered",
    }
}

/// Port for storing and loading accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert the user and its profile together.
    async fn register(&self, account: &Account) -> Result<(), AccountRepositoryError>;

    /// Load a user with its profile.
    async fn find_by_id(&self, user_id: &UserId)
    -> Result<Option<Account>, AccountRepositoryError>;
}
