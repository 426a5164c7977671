//! Driving port for reward redemption.

use async_trait::async_trait;

use crate::domain::{Actor, Error, RewardId, UserReward};

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionReceipt {
    pub user_reward: UserReward,
    pub cost: u64,
    pub balance: u64,
}

/// Driving port for spending points.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardsCommand: Send + Sync {
    /// Redeem `reward_id` for `actor`.
    ///
    /// Fails with `not_found`, `reward_inactive` or `insufficient_balance`;
    /// on failure the balance is unchanged.
    async fn redeem(&self, actor: Actor, reward_id: RewardId) -> Result<RedemptionReceipt, Error>;
}
