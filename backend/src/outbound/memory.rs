//! In-process store backing every repository port.
//!
//! Used when no database is configured and by the integration tests. All
//! tables sit behind one mutex, so each port call is atomic; the same
//! conditional-update and balance-guard rules as the SQL adapters apply.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, CollectionRepository, CollectionRepositoryError,
    LedgerRepository, LedgerRepositoryError, StatusUpdate,
};
use crate::domain::{
    Account, Collection, CollectionDetails, CollectionId, CollectionStatus, LedgerError,
    PointsLedger, PointsStatement, PointsTransaction, Profile, Redemption, Residue, ResidueId,
    Reward, RewardId, StatusChange, UserId, UserReward,
};

/// The catalogue seeded on first start.
#[must_use]
pub fn default_rewards() -> Vec<Reward> {
    vec![
        Reward {
            id: RewardId::from_uuid(Uuid::from_u128(0x6b1c_0d52_7a43_4f0e_9a57_2f5d_1c9f_3a01)),
            name: "Vale-feira R$ 10".to_owned(),
            description: Some("Voucher for the municipal farmers' market".to_owned()),
            cost: 50,
            active: true,
        },
        Reward {
            id: RewardId::from_uuid(Uuid::from_u128(0x6b1c_0d52_7a43_4f0e_9a57_2f5d_1c9f_3a02)),
            name: "Passe de ônibus".to_owned(),
            description: Some("Single city bus fare".to_owned()),
            cost: 30,
            active: true,
        },
        Reward {
            id: RewardId::from_uuid(Uuid::from_u128(0x6b1c_0d52_7a43_4f0e_9a57_2f5d_1c9f_3a03)),
            name: "Muda de árvore".to_owned(),
            description: Some("Native tree seedling from the city nursery".to_owned()),
            cost: 20,
            active: true,
        },
    ]
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<UserId, Account>,
    balances: HashMap<UserId, u64>,
    residues: HashMap<ResidueId, Residue>,
    collections: HashMap<CollectionId, Collection>,
    transactions: Vec<PointsTransaction>,
    rewards: Vec<Reward>,
    redemptions: Vec<UserReward>,
}

impl Tables {
    fn details(&self, collection: &Collection) -> Result<CollectionDetails, String> {
        let residue = self
            .residues
            .get(&collection.residue_id())
            .cloned()
            .ok_or_else(|| format!("collection {} has no residue", collection.id()))?;
        Ok(CollectionDetails {
            collection: collection.clone(),
            residue,
        })
    }

    /// The stored collection if `change` still applies to it.
    fn current(&self, change: &StatusChange) -> Option<&Collection> {
        self.collections
            .get(&change.collection_id)
            .filter(|stored| {
                stored.status() == change.from && stored.collector_id() == change.expected_collector
            })
    }
}

/// Mutex-guarded tables implementing the account, collection and ledger
/// repository ports.
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_rewards(default_rewards())
    }
}

impl InMemoryStore {
    /// An empty store with the default reward catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store offering `rewards`.
    #[must_use]
    pub fn with_rewards(rewards: Vec<Reward>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                rewards,
                ..Tables::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn register(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        let mut tables = self.lock().map_err(AccountRepositoryError::query)?;
        let username = account.user().username();
        if tables
            .accounts
            .values()
            .any(|existing| existing.user().username() == username)
        {
            return Err(AccountRepositoryError::username_taken(username.as_ref()));
        }
        if let Some(document) = account.profile().contact().document()
            && tables
                .accounts
                .values()
                .any(|existing| existing.profile().contact().document() == Some(document))
        {
            return Err(AccountRepositoryError::document_taken());
        }
        let user_id = account.user().id();
        tables.balances.insert(user_id, account.profile().points());
        tables.accounts.insert(user_id, account.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let tables = self.lock().map_err(AccountRepositoryError::query)?;
        let Some(account) = tables.accounts.get(user_id) else {
            return Ok(None);
        };
        let points = tables.balances.get(user_id).copied().unwrap_or_default();
        let profile = account.profile();
        Ok(Some(Account::from_parts(
            account.user().clone(),
            Profile::from_parts(
                profile.user_id(),
                profile.role(),
                points,
                profile.contact().clone(),
            ),
        )))
    }
}

#[async_trait]
impl CollectionRepository for InMemoryStore {
    async fn create_pickup(
        &self,
        residue: &Residue,
        collection: &Collection,
    ) -> Result<(), CollectionRepositoryError> {
        let mut tables = self.lock().map_err(CollectionRepositoryError::query)?;
        if tables
            .collections
            .values()
            .any(|existing| existing.residue_id() == residue.id())
        {
            return Err(CollectionRepositoryError::query(format!(
                "residue {} already has a pickup",
                residue.id()
            )));
        }
        tables.residues.insert(residue.id(), residue.clone());
        tables.collections.insert(collection.id(), collection.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &CollectionId,
    ) -> Result<Option<CollectionDetails>, CollectionRepositoryError> {
        let tables = self.lock().map_err(CollectionRepositoryError::query)?;
        tables
            .collections
            .get(id)
            .map(|collection| tables.details(collection))
            .transpose()
            .map_err(CollectionRepositoryError::query)
    }

    async fn list_by_status(
        &self,
        status: CollectionStatus,
    ) -> Result<Vec<Collection>, CollectionRepositoryError> {
        let tables = self.lock().map_err(CollectionRepositoryError::query)?;
        let mut found: Vec<Collection> = tables
            .collections
            .values()
            .filter(|collection| collection.status() == status)
            .cloned()
            .collect();
        found.sort_by_key(Collection::created_at);
        Ok(found)
    }

    async fn list_active_for_collector(
        &self,
        collector: &UserId,
    ) -> Result<Vec<Collection>, CollectionRepositoryError> {
        let tables = self.lock().map_err(CollectionRepositoryError::query)?;
        let mut found: Vec<Collection> = tables
            .collections
            .values()
            .filter(|collection| {
                collection.collector_id() == Some(*collector)
                    && CollectionStatus::ACTIVE.contains(&collection.status())
            })
            .cloned()
            .collect();
        found.sort_by_key(|collection| std::cmp::Reverse(collection.updated_at()));
        Ok(found)
    }

    async fn list_for_citizen(
        &self,
        citizen: &UserId,
    ) -> Result<Vec<CollectionDetails>, CollectionRepositoryError> {
        let tables = self.lock().map_err(CollectionRepositoryError::query)?;
        let mut found = tables
            .collections
            .values()
            .filter(|collection| collection.citizen_id() == *citizen)
            .map(|collection| tables.details(collection))
            .collect::<Result<Vec<_>, _>>()
            .map_err(CollectionRepositoryError::query)?;
        found.sort_by_key(|details| std::cmp::Reverse(details.collection.created_at()));
        Ok(found)
    }

    async fn apply_status_change(
        &self,
        change: &StatusChange,
    ) -> Result<StatusUpdate, CollectionRepositoryError> {
        let mut tables = self.lock().map_err(CollectionRepositoryError::query)?;
        let Some(stored) = tables.current(change).cloned() else {
            return Ok(StatusUpdate::Stale);
        };
        let updated = stored.apply(change);
        tables.collections.insert(updated.id(), updated.clone());
        Ok(StatusUpdate::Applied(updated))
    }

    async fn process_and_credit(
        &self,
        change: &StatusChange,
        credit: &PointsTransaction,
    ) -> Result<StatusUpdate, CollectionRepositoryError> {
        let mut tables = self.lock().map_err(CollectionRepositoryError::query)?;
        let Some(stored) = tables.current(change).cloned() else {
            return Ok(StatusUpdate::Stale);
        };
        let residue = tables
            .residues
            .get(&stored.residue_id())
            .cloned()
            .ok_or_else(|| {
                CollectionRepositoryError::query(format!(
                    "collection {} has no residue",
                    stored.id()
                ))
            })?;
        let balance = tables.balances.get(&credit.user_id).copied().ok_or_else(|| {
            CollectionRepositoryError::credit(format!("no balance for user {}", credit.user_id))
        })?;
        let credited = PointsLedger::apply_delta(balance, credit.points)
            .map_err(|err| CollectionRepositoryError::credit(err.to_string()))?;

        let updated = stored.apply(change);
        tables.collections.insert(updated.id(), updated.clone());
        tables.residues.insert(residue.id(), residue.finalize());
        tables.balances.insert(credit.user_id, credited);
        tables.transactions.push(credit.clone());
        Ok(StatusUpdate::Applied(updated))
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStore {
    async fn balance(&self, user_id: &UserId) -> Result<Option<u64>, LedgerRepositoryError> {
        let tables = self.lock().map_err(LedgerRepositoryError::query)?;
        Ok(tables.balances.get(user_id).copied())
    }

    async fn redeem(&self, redemption: &Redemption) -> Result<u64, LedgerRepositoryError> {
        let mut tables = self.lock().map_err(LedgerRepositoryError::query)?;
        let user_id = redemption.transaction.user_id;
        let balance = tables
            .balances
            .get(&user_id)
            .copied()
            .ok_or_else(|| LedgerRepositoryError::unknown_user(user_id.to_string()))?;
        let remaining = PointsLedger::apply_delta(balance, redemption.transaction.points)
            .map_err(|err| match err {
                LedgerError::InsufficientBalance { balance, requested } => {
                    LedgerRepositoryError::insufficient_balance(balance, requested)
                }
                other => LedgerRepositoryError::query(other.to_string()),
            })?;

        tables.balances.insert(user_id, remaining);
        tables.transactions.push(redemption.transaction.clone());
        tables.redemptions.push(redemption.user_reward.clone());
        Ok(remaining)
    }

    async fn statement(&self, user_id: &UserId) -> Result<PointsStatement, LedgerRepositoryError> {
        let tables = self.lock().map_err(LedgerRepositoryError::query)?;
        let balance = tables
            .balances
            .get(user_id)
            .copied()
            .ok_or_else(|| LedgerRepositoryError::unknown_user(user_id.to_string()))?;
        // Pushed in commit order; newest first.
        let transactions = tables
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.user_id == *user_id)
            .cloned()
            .collect();
        Ok(PointsStatement {
            balance,
            transactions,
        })
    }

    async fn find_reward(&self, id: &RewardId) -> Result<Option<Reward>, LedgerRepositoryError> {
        let tables = self.lock().map_err(LedgerRepositoryError::query)?;
        Ok(tables.rewards.iter().find(|reward| reward.id == *id).cloned())
    }

    async fn list_active_rewards(&self) -> Result<Vec<Reward>, LedgerRepositoryError> {
        let tables = self.lock().map_err(LedgerRepositoryError::query)?;
        Ok(tables
            .rewards
            .iter()
            .filter(|reward| reward.active)
            .cloned()
            .collect())
    }

    async fn list_redemptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserReward>, LedgerRepositoryError> {
        let tables = self.lock().map_err(LedgerRepositoryError::query)?;
        Ok(tables
            .redemptions
            .iter()
            .rev()
            .filter(|record| record.user_id == *user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
