//! Driving port for account registration.

use async_trait::async_trait;

use crate::domain::{Account, Error, RegistrationDraft};

/// Driving port for creating accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Register a user and its zero-balance profile.
    ///
    /// Fails with `invalid_request` on bad input and `conflict` when the
    /// username is taken.
    async fn register(&self, draft: RegistrationDraft) -> Result<Account, Error>;
}
