//! Driving port for account reads.

use async_trait::async_trait;

use crate::domain::{Account, Error, UserId};

/// Driving port for loading accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// Load a user with its profile; `not_found` when absent.
    async fn account(&self, user_id: &UserId) -> Result<Account, Error>;
}
