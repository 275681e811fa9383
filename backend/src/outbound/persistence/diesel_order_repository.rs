//! PostgreSQL-backed `OrderRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{Order, OrderId, OrderLineItem, PaymentState, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{OrderLineItemRow, OrderRow};
use super::pool::{DbPool, PoolError};
use super::schema::{order_line_items, orders};

/// Diesel-backed implementation of the order repository port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrderRepositoryError {
    map_basic_pool_error(error, OrderRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_basic_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn row_to_order(row: OrderRow) -> Result<Order, OrderRepositoryError> {
    let payment_state = row
        .payment_state
        .parse::<PaymentState>()
        .map_err(|err| OrderRepositoryError::query(format!("order {}: {err}", row.id)))?;
    Ok(Order::new(
        OrderId::from_uuid(row.id),
        UserId::from_uuid(row.user_id),
        payment_state,
    ))
}

fn row_to_line_item(row: OrderLineItemRow) -> OrderLineItem {
    OrderLineItem {
        id: row.id,
        order_id: OrderId::from_uuid(row.order_id),
        sku: row.sku,
        title: row.title,
        path: row.path,
    }
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = orders::table
            .filter(orders::id.eq(order_id.as_uuid()))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_order).transpose()
    }

    async fn find_line_items(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<OrderLineItem>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<OrderLineItemRow> = order_line_items::table
            .filter(order_line_items::order_id.eq(order_id.as_uuid()))
            .order((order_line_items::position.asc(), order_line_items::id.asc()))
            .select(OrderLineItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_line_item).collect())
    }
}
