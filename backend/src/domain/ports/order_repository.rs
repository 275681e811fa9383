//! Port for reading orders and their line items.

use async_trait::async_trait;

use crate::domain::{Order, OrderId, OrderLineItem};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "order repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "order repository query failed: {message}",
    }
}

/// Read-only port onto orders owned by the commerce system.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find an order by id.
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderRepositoryError>;

    /// Read an order's line items in purchase order.
    async fn find_line_items(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<OrderLineItem>, OrderRepositoryError>;
}

/// Fixture implementation for tests and database-less boots.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderRepository;

#[async_trait]
impl OrderRepository for FixtureOrderRepository {
    async fn find_by_id(&self, _order_id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(None)
    }

    async fn find_line_items(
        &self,
        _order_id: &OrderId,
    ) -> Result<Vec<OrderLineItem>, OrderRepositoryError> {
        Ok(Vec::new())
    }
}
