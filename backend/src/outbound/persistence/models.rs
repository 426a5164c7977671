//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types re-run the
//! domain validation and report failures as plain messages, which each
//! repository wraps in its own query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Account, CollectionId, CollectionRecord, CollectionStatus, ContactDetails, Coordinate,
    PointsTransaction, Profile, Residue, ResidueId, ResidueRecord, ResidueStatus, Reward,
    RewardId, Role, TransactionId, User, UserId, UserReward, Username,
};

use super::schema::{
    collections, points_transactions, profiles, residues, rewards, user_rewards, users,
};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub user_id: Uuid,
    pub role: String,
    pub points: i64,
    pub document: Option<String>,
    pub phone: Option<String>,
}

impl ProfileRow {
    pub fn from_domain(profile: &Profile) -> Result<Self, String> {
        Ok(Self {
            user_id: *profile.user_id().as_uuid(),
            role: profile.role().as_str().to_owned(),
            points: points_to_db(profile.points())?,
            document: profile.contact().document().map(str::to_owned),
            phone: profile.contact().phone().map(str::to_owned),
        })
    }
}

pub(crate) fn account_from_rows(user: UserRow, profile: ProfileRow) -> Result<Account, String> {
    let username = Username::new(user.username).map_err(|err| err.to_string())?;
    let role = profile.role.parse::<Role>().map_err(|err| err.to_string())?;
    let contact =
        ContactDetails::new(profile.document, profile.phone).map_err(|err| err.to_string())?;
    let id = UserId::from_uuid(user.id);
    Ok(Account::from_parts(
        User::from_parts(id, username, user.created_at),
        Profile::from_parts(id, role, points_from_db(profile.points)?, contact),
    ))
}

// ---------------------------------------------------------------------------
// Residues and collections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = residues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ResidueRow {
    pub id: Uuid,
    pub citizen_id: Uuid,
    pub residue_type: String,
    pub weight_kg: Option<f64>,
    pub units: Option<i32>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ResidueRow {
    pub fn from_domain(residue: &Residue) -> Result<Self, String> {
        let units = residue
            .quantity()
            .units()
            .map(i32::try_from)
            .transpose()
            .map_err(|_| "residue units exceed storage range".to_owned())?;
        Ok(Self {
            id: *residue.id().as_uuid(),
            citizen_id: *residue.citizen_id().as_uuid(),
            residue_type: residue.residue_type().to_owned(),
            weight_kg: residue.quantity().weight_kg(),
            units,
            notes: residue.notes().map(str::to_owned),
            status: residue.status().as_str().to_owned(),
            created_at: residue.created_at(),
        })
    }

    pub fn into_domain(self) -> Result<Residue, String> {
        let units = self
            .units
            .map(u32::try_from)
            .transpose()
            .map_err(|_| format!("residue {} has negative units", self.id))?;
        let status = self
            .status
            .parse::<ResidueStatus>()
            .map_err(|err| err.to_string())?;
        Residue::try_from(ResidueRecord {
            id: ResidueId::from_uuid(self.id),
            citizen_id: UserId::from_uuid(self.citizen_id),
            residue_type: self.residue_type,
            weight_kg: self.weight_kg,
            units,
            notes: self.notes,
            status,
            created_at: self.created_at,
        })
        .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CollectionRow {
    pub id: Uuid,
    pub residue_id: Uuid,
    pub citizen_id: Uuid,
    pub collector_id: Option<Uuid>,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl CollectionRow {
    pub fn from_domain(collection: &crate::domain::Collection) -> Self {
        Self {
            id: *collection.id().as_uuid(),
            residue_id: *collection.residue_id().as_uuid(),
            citizen_id: *collection.citizen_id().as_uuid(),
            collector_id: collection.collector_id().map(|id| *id.as_uuid()),
            status: collection.status().as_str().to_owned(),
            latitude: collection.location().latitude(),
            longitude: collection.location().longitude(),
            created_at: collection.created_at(),
            updated_at: collection.updated_at(),
            processed_at: collection.processed_at(),
        }
    }

    pub fn into_domain(self) -> Result<crate::domain::Collection, String> {
        let status = self
            .status
            .parse::<CollectionStatus>()
            .map_err(|err| err.to_string())?;
        let location =
            Coordinate::new(self.latitude, self.longitude).map_err(|err| err.to_string())?;
        Ok(CollectionRecord {
            id: CollectionId::from_uuid(self.id),
            residue_id: ResidueId::from_uuid(self.residue_id),
            citizen_id: UserId::from_uuid(self.citizen_id),
            collector_id: self.collector_id.map(UserId::from_uuid),
            status,
            location,
            created_at: self.created_at,
            updated_at: self.updated_at,
            processed_at: self.processed_at,
        }
        .into())
    }
}

// ---------------------------------------------------------------------------
// Ledger and rewards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = points_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PointsTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<&PointsTransaction> for PointsTransactionRow {
    fn from(tx: &PointsTransaction) -> Self {
        Self {
            id: *tx.id.as_uuid(),
            user_id: *tx.user_id.as_uuid(),
            points: tx.points,
            description: tx.description.clone(),
            created_at: tx.created_at,
        }
    }
}

impl From<PointsTransactionRow> for PointsTransaction {
    fn from(row: PointsTransactionRow) -> Self {
        Self {
            id: TransactionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            points: row.points,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rewards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RewardRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cost: i64,
    pub active: bool,
}

impl RewardRow {
    pub fn into_domain(self) -> Result<Reward, String> {
        Ok(Reward {
            id: RewardId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            cost: points_from_db(self.cost)?,
            active: self.active,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_rewards)]
pub(crate) struct NewUserRewardRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reward_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
}

impl From<&UserReward> for NewUserRewardRow {
    fn from(record: &UserReward) -> Self {
        Self {
            id: record.id,
            user_id: *record.user_id.as_uuid(),
            reward_id: *record.reward_id.as_uuid(),
            redeemed_at: record.redeemed_at,
        }
    }
}

/// A redemption joined with its reward's name.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct UserRewardRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reward_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
    pub reward_name: String,
}

impl From<UserRewardRow> for UserReward {
    fn from(row: UserRewardRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            reward_id: RewardId::from_uuid(row.reward_id),
            reward_name: row.reward_name,
            redeemed_at: row.redeemed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Point conversions
// ---------------------------------------------------------------------------

pub(crate) fn points_from_db(points: i64) -> Result<u64, String> {
    u64::try_from(points).map_err(|_| format!("stored point value {points} is negative"))
}

pub(crate) fn points_to_db(points: u64) -> Result<i64, String> {
    i64::try_from(points).map_err(|_| format!("point value {points} exceeds storage range"))
}
