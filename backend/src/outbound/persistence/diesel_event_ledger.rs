//! PostgreSQL-backed read side of the event ledger.

use async_trait::async_trait;
use diesel::dsl::count_distinct;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DistinctAddressQuery, EventLedger, EventLedgerError};
use crate::domain::{Event, EventKind, OrderId, SourceAddress, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::EventRow;
use super::pool::{DbPool, PoolError};
use super::schema::events;

#[derive(Clone)]
pub struct DieselEventLedger {
    pool: DbPool,
}

impl DieselEventLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EventLedgerError {
    map_basic_pool_error(error, EventLedgerError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EventLedgerError {
    map_basic_diesel_error(error, EventLedgerError::query, EventLedgerError::connection)
}

fn row_to_event(row: EventRow) -> Result<Event, EventLedgerError> {
    let kind = row
        .kind
        .parse::<EventKind>()
        .map_err(|err| EventLedgerError::query(format!("event {}: {err}", row.id)))?;

    Ok(Event {
        id: row.id,
        order_id: OrderId::from_uuid(row.order_id),
        actor: row.user_id.map(UserId::from_uuid),
        source_address: SourceAddress::from_raw(&row.ip),
        kind,
        changes: row.changes.into_iter().collect(),
        created_at: row.created_at,
    })
}

#[async_trait]
impl EventLedger for DieselEventLedger {
    async fn count_distinct_addresses(
        &self,
        query: &DistinctAddressQuery,
    ) -> Result<u64, EventLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Half-open window: strictly after `since`, up to and including `until`.
        let count: i64 = events::table
            .filter(events::order_id.eq(query.order_id.as_uuid()))
            .filter(events::changes.contains(vec![query.change.clone()]))
            .filter(events::created_at.gt(query.since))
            .filter(events::created_at.le(query.until))
            .select(count_distinct(events::ip))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        u64::try_from(count)
            .map_err(|_| EventLedgerError::query(format!("negative distinct count {count}")))
    }

    async fn list_for_order(&self, order_id: &OrderId) -> Result<Vec<Event>, EventLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<EventRow> = events::table
            .filter(events::order_id.eq(order_id.as_uuid()))
            .order((events::created_at.asc(), events::id.asc()))
            .select(EventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_event).collect()
    }
}
