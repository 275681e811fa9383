//! PostgreSQL-backed `DownloadRepository`.
//!
//! Listings join `downloads` to `orders` and keep only paid orders, ordered
//! by `(created_at, id)` so offset paging is stable.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageRequest;

use crate::domain::ports::{DownloadRepository, DownloadRepositoryError, DownloadScope};
use crate::domain::{
    AssetReference, Download, DownloadDraft, DownloadId, OrderId, PaymentState,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{DownloadMetadataUpdate, DownloadRow, NewDownloadRow};
use super::pool::{DbPool, PoolError};
use super::schema::{downloads, orders};

/// Diesel-backed implementation of the download repository port.
#[derive(Clone)]
pub struct DieselDownloadRepository {
    pool: DbPool,
}

impl DieselDownloadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DownloadRepositoryError {
    map_basic_pool_error(error, DownloadRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DownloadRepositoryError {
    map_basic_diesel_error(
        error,
        DownloadRepositoryError::query,
        DownloadRepositoryError::connection,
    )
}

fn row_to_download(row: DownloadRow) -> Result<Download, DownloadRepositoryError> {
    let DownloadRow {
        id,
        order_id,
        line_item_id,
        title,
        format,
        asset,
        download_count,
        created_at,
    } = row;

    let invalid = |message: String| DownloadRepositoryError::query(format!("download {id}: {message}"));
    let asset = AssetReference::new(asset).map_err(|err| invalid(err.to_string()))?;
    let download_count = u64::try_from(download_count)
        .map_err(|_| invalid(format!("negative download count {download_count}")))?;

    Download::new(DownloadDraft {
        id: DownloadId::from_uuid(id),
        order_id: OrderId::from_uuid(order_id),
        line_item_id,
        title,
        format,
        asset,
        download_count,
        created_at,
    })
    .map_err(|err| invalid(err.to_string()))
}

fn rows_to_downloads(rows: Vec<DownloadRow>) -> Result<Vec<Download>, DownloadRepositoryError> {
    rows.into_iter().map(row_to_download).collect()
}

fn count_to_u64(count: i64) -> Result<u64, DownloadRepositoryError> {
    u64::try_from(count)
        .map_err(|_| DownloadRepositoryError::query(format!("negative row count {count}")))
}

#[async_trait]
impl DownloadRepository for DieselDownloadRepository {
    async fn find_by_id(
        &self,
        download_id: &DownloadId,
    ) -> Result<Option<Download>, DownloadRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = downloads::table
            .filter(downloads::id.eq(download_id.as_uuid()))
            .select(DownloadRow::as_select())
            .first::<DownloadRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_download).transpose()
    }

    async fn list_paid(
        &self,
        scope: &DownloadScope,
        page: PageRequest,
    ) -> Result<Vec<Download>, DownloadRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let paid = orders::payment_state.eq(PaymentState::Paid.as_str());

        let rows: Vec<DownloadRow> = match scope {
            DownloadScope::Order(order_id) => {
                downloads::table
                    .inner_join(orders::table)
                    .filter(paid.and(orders::id.eq(order_id.as_uuid())))
                    .order((downloads::created_at.asc(), downloads::id.asc()))
                    .offset(page.offset_i64())
                    .limit(page.limit_i64())
                    .select(DownloadRow::as_select())
                    .load(&mut conn)
                    .await
            }
            DownloadScope::Owner(user_id) => {
                downloads::table
                    .inner_join(orders::table)
                    .filter(paid.and(orders::user_id.eq(user_id.as_uuid())))
                    .order((downloads::created_at.asc(), downloads::id.asc()))
                    .offset(page.offset_i64())
                    .limit(page.limit_i64())
                    .select(DownloadRow::as_select())
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        rows_to_downloads(rows)
    }

    async fn count_paid(&self, scope: &DownloadScope) -> Result<u64, DownloadRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let paid = orders::payment_state.eq(PaymentState::Paid.as_str());

        let count: i64 = match scope {
            DownloadScope::Order(order_id) => {
                downloads::table
                    .inner_join(orders::table)
                    .filter(paid.and(orders::id.eq(order_id.as_uuid())))
                    .count()
                    .get_result(&mut conn)
                    .await
            }
            DownloadScope::Owner(user_id) => {
                downloads::table
                    .inner_join(orders::table)
                    .filter(paid.and(orders::user_id.eq(user_id.as_uuid())))
                    .count()
                    .get_result(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        count_to_u64(count)
    }

    async fn list_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Download>, DownloadRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DownloadRow> = downloads::table
            .filter(downloads::order_id.eq(order_id.as_uuid()))
            .order((downloads::created_at.asc(), downloads::id.asc()))
            .select(DownloadRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_downloads(rows)
    }

    async fn save_all(
        &self,
        order_id: &OrderId,
        downloads_to_save: &[Download],
    ) -> Result<(), DownloadRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        if let Some(stray) = downloads_to_save
            .iter()
            .find(|download| download.order_id() != *order_id)
        {
            return Err(DownloadRepositoryError::query(format!(
                "download {} does not belong to order {order_id}",
                stray.id()
            )));
        }

        let now = Utc::now();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                for download in downloads_to_save {
                    let new_row = NewDownloadRow {
                        id: *download.id().as_uuid(),
                        order_id: *download.order_id().as_uuid(),
                        line_item_id: download.line_item_id(),
                        title: download.title(),
                        format: download.format(),
                        asset: download.asset().as_str(),
                        download_count: 0,
                        created_at: download.created_at(),
                    };
                    let update = DownloadMetadataUpdate {
                        title: download.title(),
                        asset: download.asset().as_str(),
                        updated_at: now,
                    };
                    diesel::insert_into(downloads::table)
                        .values(&new_row)
                        .on_conflict(downloads::id)
                        .do_update()
                        .set(&update)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
