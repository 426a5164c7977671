//! Request and response bodies for the REST API.
//!
//! Domain entities keep their invariants behind accessors and stay free of
//! wire concerns. These types are the JSON shapes clients see; each response
//! body is built from its domain counterpart with a `From` impl so handlers
//! only convert at the edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::{CollectionView, RedemptionReceipt, TransitionOutcome};
use crate::domain::{
    Account, Collection, CollectionDetails, CollectionStatus, PointsStatement, PointsTransaction,
    RankedCollection, Ranking, RankingWarning, Residue, ResidueStatus, Reward, Role, UserReward,
};

/// Registration form; the new account is signed in on success.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ana.recicla")]
    pub username: Option<String>,
    /// One of `citizen`, `collector` or `recycler`.
    #[schema(example = "citizen")]
    pub role: Option<String>,
    /// CPF or CNPJ, free-form.
    pub document: Option<String>,
    pub phone: Option<String>,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub points: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for ProfileResponse {
    fn from(account: Account) -> Self {
        let profile = account.profile();
        Self {
            id: *account.user().id().as_uuid(),
            username: account.user().username().as_ref().to_owned(),
            role: profile.role(),
            points: profile.points(),
            document: profile.contact().document().map(str::to_owned),
            phone: profile.contact().phone().map(str::to_owned),
            created_at: account.user().created_at(),
        }
    }
}

/// Pickup request: the residue and where to collect it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PickupRequestBody {
    #[schema(example = "Garrafa PET")]
    pub residue_type: Option<String>,
    #[schema(example = 2.5)]
    pub weight_kg: Option<f64>,
    #[schema(example = 10)]
    pub units: Option<u32>,
    pub notes: Option<String>,
    #[schema(example = json!(-5.1136))]
    pub latitude: Option<f64>,
    #[schema(example = json!(-42.8487))]
    pub longitude: Option<f64>,
}

/// A reported residue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResidueBody {
    pub id: Uuid,
    pub residue_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: ResidueStatus,
}

impl From<&Residue> for ResidueBody {
    fn from(residue: &Residue) -> Self {
        Self {
            id: *residue.id().as_uuid(),
            residue_type: residue.residue_type().to_owned(),
            weight_kg: residue.quantity().weight_kg(),
            units: residue.quantity().units(),
            notes: residue.notes().map(str::to_owned),
            status: residue.status(),
        }
    }
}

/// A pickup task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionBody {
    pub id: Uuid,
    pub residue_id: Uuid,
    pub citizen_id: Uuid,
    pub collector_id: Option<Uuid>,
    pub status: CollectionStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<&Collection> for CollectionBody {
    fn from(collection: &Collection) -> Self {
        Self {
            id: *collection.id().as_uuid(),
            residue_id: *collection.residue_id().as_uuid(),
            citizen_id: *collection.citizen_id().as_uuid(),
            collector_id: collection.collector_id().map(|id| *id.as_uuid()),
            status: collection.status(),
            latitude: collection.location().latitude(),
            longitude: collection.location().longitude(),
            created_at: collection.created_at(),
            updated_at: collection.updated_at(),
            processed_at: collection.processed_at(),
        }
    }
}

/// A pickup together with its residue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PickupBody {
    pub collection: CollectionBody,
    pub residue: ResidueBody,
}

impl From<&CollectionDetails> for PickupBody {
    fn from(details: &CollectionDetails) -> Self {
        Self {
            collection: CollectionBody::from(&details.collection),
            residue: ResidueBody::from(&details.residue),
        }
    }
}

/// A pickup with the statuses the caller may move it to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionViewBody {
    pub collection: CollectionBody,
    pub residue: ResidueBody,
    pub allowed_transitions: Vec<CollectionStatus>,
}

impl From<CollectionView> for CollectionViewBody {
    fn from(view: CollectionView) -> Self {
        Self {
            collection: CollectionBody::from(&view.details.collection),
            residue: ResidueBody::from(&view.details.residue),
            allowed_transitions: view.allowed_transitions,
        }
    }
}

/// Collector position for ranking; both or neither.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OpenCollectionsQuery {
    /// Latitude in decimal degrees.
    #[param(example = "-23.5505")]
    pub lat: Option<String>,
    /// Longitude in decimal degrees.
    #[param(example = "-46.6333")]
    pub lon: Option<String>,
}

/// An open pickup and its distance from the collector.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedCollectionBody {
    pub collection: CollectionBody,
    /// Kilometres from the collector; absent without a usable location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<&RankedCollection> for RankedCollectionBody {
    fn from(entry: &RankedCollection) -> Self {
        Self {
            collection: CollectionBody::from(&entry.collection),
            distance_km: entry.distance_km,
        }
    }
}

/// Open pickups, nearest first when a location was given.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub collections: Vec<RankedCollectionBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<RankingWarning>,
}

impl From<Ranking> for RankingResponse {
    fn from(ranking: Ranking) -> Self {
        Self {
            collections: ranking.entries.iter().map(RankedCollectionBody::from).collect(),
            warning: ranking.warning,
        }
    }
}

/// Requested status change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    #[schema(example = "assigned")]
    pub status: Option<String>,
}

/// Outcome of a status change request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub collection: CollectionBody,
    /// `false` when the collection already had the requested status.
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<u64>,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            collection: CollectionBody::from(&outcome.collection),
            changed: outcome.changed,
            points_awarded: outcome.points_awarded,
        }
    }
}

/// A catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardBody {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cost: u64,
}

impl From<&Reward> for RewardBody {
    fn from(reward: &Reward) -> Self {
        Self {
            id: *reward.id.as_uuid(),
            name: reward.name.clone(),
            description: reward.description.clone(),
            cost: reward.cost,
        }
    }
}

/// A past redemption.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionBody {
    pub id: Uuid,
    pub reward_id: Uuid,
    pub reward_name: String,
    pub redeemed_at: DateTime<Utc>,
}

impl From<&UserReward> for RedemptionBody {
    fn from(record: &UserReward) -> Self {
        Self {
            id: record.id,
            reward_id: *record.reward_id.as_uuid(),
            reward_name: record.reward_name.clone(),
            redeemed_at: record.redeemed_at,
        }
    }
}

/// A successful redemption and the remaining balance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionResponse {
    pub redemption: RedemptionBody,
    pub cost: u64,
    pub balance: u64,
}

impl From<RedemptionReceipt> for RedemptionResponse {
    fn from(receipt: RedemptionReceipt) -> Self {
        Self {
            redemption: RedemptionBody::from(&receipt.user_reward),
            cost: receipt.cost,
            balance: receipt.balance,
        }
    }
}

/// One ledger entry; positive credits, negative debits.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PointsTransactionBody {
    pub id: Uuid,
    pub points: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<&PointsTransaction> for PointsTransactionBody {
    fn from(tx: &PointsTransaction) -> Self {
        Self {
            id: *tx.id.as_uuid(),
            points: tx.points,
            description: tx.description.clone(),
            created_at: tx.created_at,
        }
    }
}

/// Balance and history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PointsHistoryResponse {
    pub balance: u64,
    pub transactions: Vec<PointsTransactionBody>,
}

impl From<PointsStatement> for PointsHistoryResponse {
    fn from(statement: PointsStatement) -> Self {
        Self {
            balance: statement.balance,
            transactions: statement
                .transactions
                .iter()
                .map(PointsTransactionBody::from)
                .collect(),
        }
    }
}
