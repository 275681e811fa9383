//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Orders owned by the commerce system. Read-only here.
    orders (id) {
        id -> Uuid,
        user_id -> Uuid,
        /// One of `pending`, `paid`, `failed`, `refunded`.
        payment_state -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Purchased products on an order.
    order_line_items (id) {
        id -> Uuid,
        order_id -> Uuid,
        sku -> Varchar,
        title -> Varchar,
        /// Catalogue path used for reconciliation.
        path -> Varchar,
        position -> Int4,
    }
}

diesel::table! {
    /// Downloadable assets attached to orders.
    downloads (id) {
        id -> Uuid,
        order_id -> Uuid,
        line_item_id -> Nullable<Uuid>,
        title -> Varchar,
        format -> Nullable<Varchar>,
        asset -> Text,
        /// Grows only inside the audit transaction.
        download_count -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only event ledger.
    events (id) {
        id -> Uuid,
        order_id -> Uuid,
        /// Null for anonymous actors.
        user_id -> Nullable<Uuid>,
        ip -> Varchar,
        kind -> Varchar,
        changes -> Array<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(order_line_items -> orders (order_id));
diesel::joinable!(downloads -> orders (order_id));
diesel::joinable!(events -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(orders, order_line_items, downloads, events);
