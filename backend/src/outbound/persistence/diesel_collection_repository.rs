//! PostgreSQL-backed `CollectionRepository` implementation using Diesel ORM.
//!
//! Status changes are conditional updates keyed on the expected status and
//! collector, so two writers racing for the same pickup cannot both win.
//! Processing finalises the residue and credits the citizen inside the same
//! transaction as the status change.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{CollectionRepository, CollectionRepositoryError, StatusUpdate};
use crate::domain::{
    Collection, CollectionDetails, CollectionId, CollectionStatus, PointsTransaction, Residue,
    ResidueStatus, StatusChange, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{CollectionRow, PointsTransactionRow, ResidueRow};
use super::pool::{DbPool, PoolError};
use super::schema::{collections, points_transactions, profiles, residues};

/// Diesel-backed implementation of the collection repository port.
#[derive(Clone)]
pub struct DieselCollectionRepository {
    pool: DbPool,
}

impl DieselCollectionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CollectionRepositoryError {
    map_basic_pool_error(error, CollectionRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> CollectionRepositoryError {
    map_basic_diesel_error(
        error,
        CollectionRepositoryError::query,
        CollectionRepositoryError::connection,
    )
}

/// Failures inside the processing transaction.
#[derive(Debug)]
enum ProcessingError {
    Diesel(DieselError),
    Credit(String),
}

impl From<DieselError> for ProcessingError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl From<ProcessingError> for CollectionRepositoryError {
    fn from(error: ProcessingError) -> Self {
        match error {
            ProcessingError::Diesel(error) => map_diesel_error(error),
            ProcessingError::Credit(message) => Self::credit(message),
        }
    }
}

fn collection_from_row(row: CollectionRow) -> Result<Collection, CollectionRepositoryError> {
    row.into_domain().map_err(CollectionRepositoryError::query)
}

fn details_from_rows(
    (collection, residue): (CollectionRow, ResidueRow),
) -> Result<CollectionDetails, CollectionRepositoryError> {
    Ok(CollectionDetails {
        collection: collection_from_row(collection)?,
        residue: residue.into_domain().map_err(CollectionRepositoryError::query)?,
    })
}

fn collections_from_rows(
    rows: Vec<CollectionRow>,
) -> Result<Vec<Collection>, CollectionRepositoryError> {
    rows.into_iter().map(collection_from_row).collect()
}

/// Apply `change` only if the row is still in the state it was planned
/// against. Returns `None` when another writer got there first.
async fn update_if_current(
    conn: &mut AsyncPgConnection,
    change: &StatusChange,
) -> Result<Option<CollectionRow>, DieselError> {
    let processed_at = change.is_processing().then_some(change.at);
    diesel::update(
        collections::table
            .filter(collections::id.eq(change.collection_id.as_uuid()))
            .filter(collections::status.eq(change.from.as_str()))
            .filter(
                collections::collector_id
                    .is_not_distinct_from(change.expected_collector.map(|id| *id.as_uuid())),
            ),
    )
    .set((
        collections::status.eq(change.to.as_str()),
        collections::collector_id.eq(change.collector.map(|id| *id.as_uuid())),
        collections::updated_at.eq(change.at),
        collections::processed_at.eq(processed_at),
    ))
    .returning(CollectionRow::as_returning())
    .get_result(conn)
    .await
    .optional()
}

#[async_trait]
impl CollectionRepository for DieselCollectionRepository {
    async fn create_pickup(
        &self,
        residue: &Residue,
        collection: &Collection,
    ) -> Result<(), CollectionRepositoryError> {
        let residue_row =
            ResidueRow::from_domain(residue).map_err(CollectionRepositoryError::query)?;
        let collection_row = CollectionRow::from_domain(collection);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(residues::table)
                    .values(&residue_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(collections::table)
                    .values(&collection_row)
                    .execute(conn)
                    .await?;
                Ok::<_, DieselError>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &CollectionId,
    ) -> Result<Option<CollectionDetails>, CollectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = collections::table
            .inner_join(residues::table)
            .filter(collections::id.eq(id.as_uuid()))
            .select((CollectionRow::as_select(), ResidueRow::as_select()))
            .first::<(CollectionRow, ResidueRow)>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(details_from_rows).transpose()
    }

    async fn list_by_status(
        &self,
        status: CollectionStatus,
    ) -> Result<Vec<Collection>, CollectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CollectionRow> = collections::table
            .filter(collections::status.eq(status.as_str()))
            .order((collections::created_at.asc(), collections::id.asc()))
            .select(CollectionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        collections_from_rows(rows)
    }

    async fn list_active_for_collector(
        &self,
        collector: &UserId,
    ) -> Result<Vec<Collection>, CollectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let active: Vec<&str> = CollectionStatus::ACTIVE
            .iter()
            .map(|status| status.as_str())
            .collect();

        let rows: Vec<CollectionRow> = collections::table
            .filter(collections::collector_id.eq(collector.as_uuid()))
            .filter(collections::status.eq_any(active))
            .order(collections::updated_at.desc())
            .select(CollectionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        collections_from_rows(rows)
    }

    async fn list_for_citizen(
        &self,
        citizen: &UserId,
    ) -> Result<Vec<CollectionDetails>, CollectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(CollectionRow, ResidueRow)> = collections::table
            .inner_join(residues::table)
            .filter(collections::citizen_id.eq(citizen.as_uuid()))
            .order(collections::created_at.desc())
            .select((CollectionRow::as_select(), ResidueRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(details_from_rows).collect()
    }

    async fn apply_status_change(
        &self,
        change: &StatusChange,
    ) -> Result<StatusUpdate, CollectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        match update_if_current(&mut conn, change)
            .await
            .map_err(map_diesel_error)?
        {
            Some(row) => Ok(StatusUpdate::Applied(collection_from_row(row)?)),
            None => {
                debug!(collection_id = %change.collection_id, "conditional update matched no row");
                Ok(StatusUpdate::Stale)
            }
        }
    }

    async fn process_and_credit(
        &self,
        change: &StatusChange,
        credit: &PointsTransaction,
    ) -> Result<StatusUpdate, CollectionRepositoryError> {
        let credit_row = PointsTransactionRow::from(credit);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = conn
            .transaction(|conn| {
                async move {
                    let Some(row) = update_if_current(conn, change).await? else {
                        return Ok::<_, ProcessingError>(None);
                    };

                    diesel::update(residues::table.filter(residues::id.eq(row.residue_id)))
                        .set(residues::status.eq(ResidueStatus::Finalized.as_str()))
                        .execute(conn)
                        .await?;

                    diesel::insert_into(points_transactions::table)
                        .values(&credit_row)
                        .execute(conn)
                        .await?;

                    let credited = diesel::update(
                        profiles::table
                            .filter(profiles::user_id.eq(credit_row.user_id))
                            .filter((profiles::points + credit_row.points).ge(0)),
                    )
                    .set(profiles::points.eq(profiles::points + credit_row.points))
                    .execute(conn)
                    .await?;
                    if credited == 0 {
                        return Err(ProcessingError::Credit(format!(
                            "no balance row accepted the credit for user {}",
                            credit_row.user_id
                        )));
                    }

                    Ok(Some(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(CollectionRepositoryError::from)?;

        match updated {
            Some(row) => Ok(StatusUpdate::Applied(collection_from_row(row)?)),
            None => Ok(StatusUpdate::Stale),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn credit_failures_keep_their_message() {
        let mapped = CollectionRepositoryError::from(ProcessingError::Credit(
            "no balance row".to_owned(),
        ));
        assert_eq!(mapped, CollectionRepositoryError::credit("no balance row"));
    }

    #[rstest]
    fn diesel_failures_inside_processing_are_query_errors() {
        let mapped = CollectionRepositoryError::from(ProcessingError::from(DieselError::NotFound));
        assert!(matches!(mapped, CollectionRepositoryError::Query { .. }));
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        assert!(matches!(
            map_pool_error(PoolError::checkout("refused")),
            CollectionRepositoryError::Connection { .. }
        ));
    }
}
