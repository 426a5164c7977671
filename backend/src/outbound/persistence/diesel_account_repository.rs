//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! A user row and its profile are written in one transaction so no account
//! exists without a role and balance.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{Account, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error, violated_unique_constraint,
};
use super::models::{NewUserRow, ProfileRow, UserRow, account_from_rows};
use super::pool::{DbPool, PoolError};
use super::schema::{profiles, users};

/// Diesel-backed implementation of the account repository port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    map_basic_pool_error(error, AccountRepositoryError::connection)
}

/// Unique constraint Postgres names for `profiles.document`.
const DOCUMENT_UNIQUE_CONSTRAINT: &str = "profiles_document_key";

/// Map a failed registration, telling a reused document apart from a
/// reused username.
fn map_register_error(error: DieselError, username: &str) -> AccountRepositoryError {
    if violated_unique_constraint(&error) == Some(DOCUMENT_UNIQUE_CONSTRAINT) {
        return AccountRepositoryError::document_taken();
    }
    if is_unique_violation(&error) {
        return AccountRepositoryError::username_taken(username);
    }
    map_diesel_error(error)
}

fn map_diesel_error(error: DieselError) -> AccountRepositoryError {
    map_basic_diesel_error(
        error,
        AccountRepositoryError::query,
        AccountRepositoryError::connection,
    )
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn register(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        let user = account.user();
        let new_user = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            created_at: user.created_at(),
        };
        let profile =
            ProfileRow::from_domain(account.profile()).map_err(AccountRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&new_user)
                    .execute(conn)
                    .await?;
                diesel::insert_into(profiles::table)
                    .values(&profile)
                    .execute(conn)
                    .await?;
                Ok::<_, DieselError>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| map_register_error(error, user.username().as_ref()))
    }

    async fn find_by_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .inner_join(profiles::table)
            .filter(users::id.eq(user_id.as_uuid()))
            .select((UserRow::as_select(), ProfileRow::as_select()))
            .first::<(UserRow, ProfileRow)>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(user, profile)| {
            account_from_rows(user, profile).map_err(AccountRepositoryError::query)
        })
        .transpose()
    }
}
