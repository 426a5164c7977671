//! Port for the points ledger and reward catalogue.

use async_trait::async_trait;

use crate::domain::{PointsStatement, Redemption, Reward, RewardId, UserId, UserReward};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger repository adapters.
    pub enum LedgerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "ledger repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "ledger repository query failed: {message}",
        /// The guarded balance update refused the debit.
        InsufficientBalance { balance: u64, requested: u64 } =>
            "balance of {balance} points is below the {requested} requested",
        /// No profile exists for the user.
        UnknownUser { user_id: String } => "no profile for user {user_id}",
    }
}

/// Port for balances, ledger history and rewards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Current balance, or `None` for an unknown user.
    async fn balance(&self, user_id: &UserId) -> Result<Option<u64>, LedgerRepositoryError>;

    /// Post the redemption debit and record the redemption atomically,
    /// returning the new balance. The debit is guarded against the stored
    /// balance, not the one the caller read.
    async fn redeem(&self, redemption: &Redemption) -> Result<u64, LedgerRepositoryError>;

    /// Balance and history, newest first.
    async fn statement(&self, user_id: &UserId) -> Result<PointsStatement, LedgerRepositoryError>;

    /// Load a reward, active or not.
    async fn find_reward(&self, id: &RewardId) -> Result<Option<Reward>, LedgerRepositoryError>;

    /// Active rewards, cheapest first.
    async fn list_active_rewards(&self) -> Result<Vec<Reward>, LedgerRepositoryError>;

    /// Redemptions by `user_id`, newest first.
    async fn list_redemptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserReward>, LedgerRepositoryError>;
}
