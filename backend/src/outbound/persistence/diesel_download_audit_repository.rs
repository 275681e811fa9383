//! PostgreSQL-backed `DownloadAuditRepository`.
//!
//! The counter increment and the ledger append run in one transaction. When
//! the download row is gone nothing is appended.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    DownloadAccessRecord, DownloadAuditRepository, DownloadAuditRepositoryError,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewEventRow;
use super::pool::{DbPool, PoolError};
use super::schema::{downloads, events};

/// Diesel-backed implementation of the download audit port.
#[derive(Clone)]
pub struct DieselDownloadAuditRepository {
    pool: DbPool,
}

impl DieselDownloadAuditRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DownloadAuditRepositoryError {
    map_basic_pool_error(error, DownloadAuditRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DownloadAuditRepositoryError {
    map_basic_diesel_error(
        error,
        DownloadAuditRepositoryError::transaction,
        DownloadAuditRepositoryError::connection,
    )
}

fn event_row(record: &DownloadAccessRecord, id: Uuid) -> NewEventRow<'_> {
    let event = &record.event;
    NewEventRow {
        id,
        order_id: *event.order_id.as_uuid(),
        user_id: event.actor.as_ref().map(|actor| *actor.as_uuid()),
        ip: event.source_address.as_str(),
        kind: event.kind.as_str(),
        changes: event.changes.iter().cloned().collect(),
        created_at: event.created_at,
    }
}

#[async_trait]
impl DownloadAuditRepository for DieselDownloadAuditRepository {
    async fn record_access(
        &self,
        record: &DownloadAccessRecord,
    ) -> Result<u64, DownloadAuditRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let download_id = *record.download_id.as_uuid();
        let new_event = event_row(record, Uuid::new_v4());
        let now = Utc::now();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let committed: Option<i64> = conn
            .transaction(|conn| {
                async move {
                    let count: Option<i64> =
                        diesel::update(downloads::table.filter(downloads::id.eq(download_id)))
                            .set((
                                downloads::download_count.eq(downloads::download_count + 1),
                                downloads::updated_at.eq(now),
                            ))
                            .returning(downloads::download_count)
                            .get_result(conn)
                            .await
                            .optional()?;

                    if count.is_some() {
                        diesel::insert_into(events::table)
                            .values(&new_event)
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, diesel::result::Error>(count)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let count = committed.ok_or_else(|| {
            DownloadAuditRepositoryError::missing_download(record.download_id.to_string())
        })?;
        debug!(download_id = %record.download_id, count, "download access recorded");

        u64::try_from(count).map_err(|_| {
            DownloadAuditRepositoryError::transaction(format!("negative download count {count}"))
        })
    }
}
