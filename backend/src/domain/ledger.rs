//! Loyalty points: ledger postings, rewards and redemptions.
//!
//! [`PointsLedger`] decides what may be posted given a known balance; the
//! ledger repository applies each posting atomically with a guarded balance
//! update, so the sum of a user's transactions always equals their profile
//! balance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{CollectionId, UserId};

/// Ledger rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("point amounts must be greater than zero")]
    NonPositiveAmount,
    #[error("balance of {balance} points is below the {requested} requested")]
    InsufficientBalance { balance: u64, requested: u64 },
    #[error("reward {name} is not currently available")]
    RewardInactive { name: String },
    #[error("point amount {amount} is out of range")]
    AmountOutOfRange { amount: u64 },
}

/// Ledger entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// Immutable ledger entry. Positive deltas are credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub points: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Reward identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardId(Uuid);

impl RewardId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage or a request path.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalogue entry redeemable for points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    pub id: RewardId,
    pub name: String,
    pub description: Option<String>,
    pub cost: u64,
    pub active: bool,
}

/// Redemption record; append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReward {
    pub id: Uuid,
    pub user_id: UserId,
    pub reward_id: RewardId,
    pub reward_name: String,
    pub redeemed_at: DateTime<Utc>,
}

/// A debit and the redemption it pays for; stored together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub transaction: PointsTransaction,
    pub user_reward: UserReward,
}

/// A user's balance with their history, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsStatement {
    pub balance: u64,
    pub transactions: Vec<PointsTransaction>,
}

impl PointsStatement {
    /// Sum of every delta in the history.
    #[must_use]
    pub fn ledger_total(&self) -> i64 {
        self.transactions.iter().map(|tx| tx.points).sum()
    }
}

/// Ledger rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsLedger;

impl PointsLedger {
    /// Build a credit of `amount` points.
    pub fn credit(
        user_id: UserId,
        amount: u64,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<PointsTransaction, LedgerError> {
        let points = Self::signed(amount)?;
        Ok(PointsTransaction {
            id: TransactionId::random(),
            user_id,
            points,
            description: description.into(),
            created_at: now,
        })
    }

    /// Build a debit of `amount` points against `balance`.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use reciclai::domain::{LedgerError, PointsLedger, UserId};
    ///
    /// let user = UserId::random();
    /// let debit = PointsLedger::debit(user, 10, 10, "voucher", Utc::now()).expect("exact balance");
    /// assert_eq!(debit.points, -10);
    /// assert_eq!(
    ///     PointsLedger::debit(user, 9, 10, "voucher", Utc::now()),
    ///     Err(LedgerError::InsufficientBalance { balance: 9, requested: 10 })
    /// );
    /// ```
    pub fn debit(
        user_id: UserId,
        balance: u64,
        amount: u64,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<PointsTransaction, LedgerError> {
        let points = Self::signed(amount)?;
        if amount > balance {
            return Err(LedgerError::InsufficientBalance {
                balance,
                requested: amount,
            });
        }
        Ok(PointsTransaction {
            id: TransactionId::random(),
            user_id,
            points: -points,
            description: description.into(),
            created_at: now,
        })
    }

    /// Build the debit and redemption record for `reward`.
    pub fn redeem(
        user_id: UserId,
        balance: u64,
        reward: &Reward,
        now: DateTime<Utc>,
    ) -> Result<Redemption, LedgerError> {
        if !reward.active {
            return Err(LedgerError::RewardInactive {
                name: reward.name.clone(),
            });
        }
        let transaction = Self::debit(
            user_id,
            balance,
            reward.cost,
            format!("reward {} redeemed", reward.name),
            now,
        )?;
        Ok(Redemption {
            transaction,
            user_reward: UserReward {
                id: Uuid::new_v4(),
                user_id,
                reward_id: reward.id,
                reward_name: reward.name.clone(),
                redeemed_at: now,
            },
        })
    }

    /// Build the credit earned by the citizen of a processed collection.
    pub fn award_for_collection(
        citizen_id: UserId,
        collection_id: CollectionId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<PointsTransaction, LedgerError> {
        Self::credit(
            citizen_id,
            amount,
            format!("collection {collection_id} processed"),
            now,
        )
    }

    /// New balance after `delta`, refusing to go below zero.
    ///
    /// Storage adapters use this as the balance guard.
    pub fn apply_delta(balance: u64, delta: i64) -> Result<u64, LedgerError> {
        let requested = delta.unsigned_abs();
        if delta >= 0 {
            balance
                .checked_add(requested)
                .ok_or(LedgerError::AmountOutOfRange { amount: requested })
        } else {
            balance
                .checked_sub(requested)
                .ok_or(LedgerError::InsufficientBalance { balance, requested })
        }
    }

    fn signed(amount: u64) -> Result<i64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        i64::try_from(amount).map_err(|_| LedgerError::AmountOutOfRange { amount })
    }
}
