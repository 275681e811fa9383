//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer; repositories convert them
//! into validated domain values.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{downloads, events, order_line_items, orders};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_state: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_line_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderLineItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sku: String,
    pub title: String,
    pub path: String,
}

/// Row struct for reading from the downloads table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = downloads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DownloadRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub line_item_id: Option<Uuid>,
    pub title: String,
    pub format: Option<String>,
    pub asset: String,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Insertable download written by reconciliation.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = downloads)]
pub(crate) struct NewDownloadRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub line_item_id: Option<Uuid>,
    pub title: &'a str,
    pub format: Option<&'a str>,
    pub asset: &'a str,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Catalogue metadata refreshed on conflict. Leaves `download_count` alone.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = downloads)]
pub(crate) struct DownloadMetadataUpdate<'a> {
    pub title: &'a str,
    pub asset: &'a str,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ip: String,
    pub kind: String,
    pub changes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub(crate) struct NewEventRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ip: &'a str,
    pub kind: &'a str,
    pub changes: Vec<String>,
    pub created_at: DateTime<Utc>,
}
