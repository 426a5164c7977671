//! Points and rewards service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    LedgerRepository, LedgerRepositoryError, RedemptionReceipt, RewardsCommand, RewardsQuery,
};
use crate::domain::{
    Actor, Error, LedgerError, PointsLedger, PointsStatement, Reward, RewardId, UserReward,
};

fn map_repository_error(error: LedgerRepositoryError) -> Error {
    match error {
        LedgerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ledger repository unavailable: {message}"))
        }
        LedgerRepositoryError::Query { message } => {
            Error::internal(format!("ledger repository error: {message}"))
        }
        LedgerRepositoryError::InsufficientBalance { balance, requested } => {
            insufficient_balance(balance, requested)
        }
        LedgerRepositoryError::UnknownUser { user_id } => {
            Error::not_found(format!("no points profile for user {user_id}"))
        }
    }
}

fn insufficient_balance(balance: u64, requested: u64) -> Error {
    Error::insufficient_balance(format!(
        "balance of {balance} points is below the {requested} required"
    ))
    .with_details(json!({ "balance": balance, "requested": requested }))
}

fn map_ledger_error(error: LedgerError) -> Error {
    match error {
        LedgerError::InsufficientBalance { balance, requested } => {
            insufficient_balance(balance, requested)
        }
        LedgerError::RewardInactive { .. } => Error::reward_inactive(error.to_string()),
        LedgerError::NonPositiveAmount | LedgerError::AmountOutOfRange { .. } => {
            Error::internal(format!("reward cost is invalid: {error}"))
        }
    }
}

/// Domain service implementing [`RewardsCommand`] and [`RewardsQuery`].
#[derive(Clone)]
pub struct RewardsService<R> {
    ledger_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> RewardsService<R> {
    /// Create the service over a ledger repository.
    pub fn new(ledger_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger_repo, clock }
    }
}

#[async_trait]
impl<R> RewardsCommand for RewardsService<R>
where
    R: LedgerRepository,
{
    async fn redeem(&self, actor: Actor, reward_id: RewardId) -> Result<RedemptionReceipt, Error> {
        let reward = self
            .ledger_repo
            .find_reward(&reward_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("reward {reward_id} not found")))?;
        let user_id = actor.user_id();
        let balance = self
            .ledger_repo
            .balance(&user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("no points profile for user {user_id}")))?;

        let redemption = PointsLedger::redeem(user_id, balance, &reward, self.clock.utc())
            .map_err(map_ledger_error)?;
        let balance = self
            .ledger_repo
            .redeem(&redemption)
            .await
            .map_err(map_repository_error)?;

        info!(
            user_id = %user_id,
            reward_id = %reward_id,
            cost = reward.cost,
            balance,
            "reward redeemed"
        );
        Ok(RedemptionReceipt {
            user_reward: redemption.user_reward,
            cost: reward.cost,
            balance,
        })
    }
}

#[async_trait]
impl<R> RewardsQuery for RewardsService<R>
where
    R: LedgerRepository,
{
    async fn catalogue(&self) -> Result<Vec<Reward>, Error> {
        let mut rewards = self
            .ledger_repo
            .list_active_rewards()
            .await
            .map_err(map_repository_error)?;
        rewards.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.name.cmp(&b.name)));
        Ok(rewards)
    }

    async fn points_history(&self, actor: Actor) -> Result<PointsStatement, Error> {
        let mut statement = self
            .ledger_repo
            .statement(&actor.user_id())
            .await
            .map_err(map_repository_error)?;
        statement
            .transactions
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(statement)
    }

    async fn redemptions(&self, actor: Actor) -> Result<Vec<UserReward>, Error> {
        let mut redemptions = self
            .ledger_repo
            .list_redemptions(&actor.user_id())
            .await
            .map_err(map_repository_error)?;
        redemptions.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at));
        Ok(redemptions)
    }
}

#[cfg(test)]
#[path = "rewards_service_tests.rs"]
mod tests;
