//! PostgreSQL-backed `LedgerRepository` implementation using Diesel ORM.
//!
//! Redemptions debit the balance with a guarded update
//! (`points >= cost`) and record the ledger row and the redemption in the
//! same transaction. A concurrent redemption that drains the balance first
//! leaves the guard unmatched and nothing is written.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{LedgerRepository, LedgerRepositoryError};
use crate::domain::{
    PointsStatement, PointsTransaction, Redemption, Reward, RewardId, UserId, UserReward,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    NewUserRewardRow, PointsTransactionRow, RewardRow, UserRewardRow, points_from_db,
};
use super::pool::{DbPool, PoolError};
use super::schema::{points_transactions, profiles, rewards, user_rewards};

/// Diesel-backed implementation of the ledger repository port.
#[derive(Clone)]
pub struct DieselLedgerRepository {
    pool: DbPool,
}

impl DieselLedgerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LedgerRepositoryError {
    map_basic_pool_error(error, LedgerRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> LedgerRepositoryError {
    map_basic_diesel_error(
        error,
        LedgerRepositoryError::query,
        LedgerRepositoryError::connection,
    )
}

/// Failures inside the redemption transaction.
#[derive(Debug)]
enum RedeemError {
    Diesel(DieselError),
    Ledger(LedgerRepositoryError),
}

impl From<DieselError> for RedeemError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl From<RedeemError> for LedgerRepositoryError {
    fn from(error: RedeemError) -> Self {
        match error {
            RedeemError::Diesel(error) => map_diesel_error(error),
            RedeemError::Ledger(error) => error,
        }
    }
}

fn stored_points(points: i64) -> Result<u64, LedgerRepositoryError> {
    points_from_db(points).map_err(LedgerRepositoryError::query)
}

#[async_trait]
impl LedgerRepository for DieselLedgerRepository {
    async fn balance(&self, user_id: &UserId) -> Result<Option<u64>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let points = profiles::table
            .filter(profiles::user_id.eq(user_id.as_uuid()))
            .select(profiles::points)
            .first::<i64>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        points.map(stored_points).transpose()
    }

    async fn redeem(&self, redemption: &Redemption) -> Result<u64, LedgerRepositoryError> {
        let debit_row = PointsTransactionRow::from(&redemption.transaction);
        let reward_row = NewUserRewardRow::from(&redemption.user_reward);
        let cost = debit_row.points.saturating_neg();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let remaining = conn
            .transaction(|conn| {
                async move {
                    let debited = diesel::update(
                        profiles::table
                            .filter(profiles::user_id.eq(debit_row.user_id))
                            .filter(profiles::points.ge(cost)),
                    )
                    .set(profiles::points.eq(profiles::points - cost))
                    .returning(profiles::points)
                    .get_result::<i64>(conn)
                    .await
                    .optional()?;

                    let Some(remaining) = debited else {
                        let balance = profiles::table
                            .filter(profiles::user_id.eq(debit_row.user_id))
                            .select(profiles::points)
                            .first::<i64>(conn)
                            .await
                            .optional()?;
                        let error = match balance {
                            Some(balance) => LedgerRepositoryError::insufficient_balance(
                                balance.max(0).unsigned_abs(),
                                cost.unsigned_abs(),
                            ),
                            None => {
                                LedgerRepositoryError::unknown_user(debit_row.user_id.to_string())
                            }
                        };
                        return Err(RedeemError::Ledger(error));
                    };

                    diesel::insert_into(points_transactions::table)
                        .values(&debit_row)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(user_rewards::table)
                        .values(&reward_row)
                        .execute(conn)
                        .await?;

                    Ok(remaining)
                }
                .scope_boxed()
            })
            .await
            .map_err(LedgerRepositoryError::from)?;

        stored_points(remaining)
    }

    async fn statement(&self, user_id: &UserId) -> Result<PointsStatement, LedgerRepositoryError> {
        let Some(balance) = self.balance(user_id).await? else {
            return Err(LedgerRepositoryError::unknown_user(user_id.to_string()));
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PointsTransactionRow> = points_transactions::table
            .filter(points_transactions::user_id.eq(user_id.as_uuid()))
            .order((
                points_transactions::created_at.desc(),
                points_transactions::id.desc(),
            ))
            .select(PointsTransactionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(PointsStatement {
            balance,
            transactions: rows.into_iter().map(PointsTransaction::from).collect(),
        })
    }

    async fn find_reward(&self, id: &RewardId) -> Result<Option<Reward>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = rewards::table
            .filter(rewards::id.eq(id.as_uuid()))
            .select(RewardRow::as_select())
            .first::<RewardRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_domain().map_err(LedgerRepositoryError::query))
            .transpose()
    }

    async fn list_active_rewards(&self) -> Result<Vec<Reward>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<RewardRow> = rewards::table
            .filter(rewards::active.eq(true))
            .order((rewards::cost.asc(), rewards::name.asc()))
            .select(RewardRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(LedgerRepositoryError::query))
            .collect()
    }

    async fn list_redemptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserReward>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRewardRow> = user_rewards::table
            .inner_join(rewards::table)
            .filter(user_rewards::user_id.eq(user_id.as_uuid()))
            .order(user_rewards::redeemed_at.desc())
            .select((
                user_rewards::id,
                user_rewards::user_id,
                user_rewards::reward_id,
                user_rewards::redeemed_at,
                rewards::name,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(UserReward::from).collect())
    }
}
