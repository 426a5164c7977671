//! Driving port for rewards and point history.

use async_trait::async_trait;

use crate::domain::{Actor, Error, PointsStatement, Reward, UserReward};

/// Driving port for ledger reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardsQuery: Send + Sync {
    /// Active rewards, cheapest first.
    async fn catalogue(&self) -> Result<Vec<Reward>, Error>;

    /// Balance and transactions, newest first.
    async fn points_history(&self, actor: Actor) -> Result<PointsStatement, Error>;

    /// The actor's redemptions, newest first.
    async fn redemptions(&self, actor: Actor) -> Result<Vec<UserReward>, Error>;
}
