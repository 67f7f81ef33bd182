//! Relational backend configuration.
//!
//! Handles the SeaORM connection and table creation. Tables are generated from
//! the entity definitions with `Schema::create_table_from_entity`, so the
//! schema always matches the Rust structs. Postgres is used in deployment;
//! SQLite is the local and test default.

use crate::entities::{MenuItem, Order, OrderItem};
use crate::errors::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;

/// Fallback used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/bistro_pos.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Creates a lazily connected pool for `database_url`.
///
/// No connection is opened until the first query, so an unreachable server
/// shows up as a failed probe instead of a startup error.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .connect_lazy(true)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    Database::connect(options).await.map_err(Into::into)
}

/// Creates all necessary database tables if they do not exist yet.
///
/// Tables are created parents first so foreign keys resolve: menu items and
/// orders, then order items.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut menu_table = schema.create_table_from_entity(MenuItem);
    let mut order_table = schema.create_table_from_entity(Order);
    let mut order_item_table = schema.create_table_from_entity(OrderItem);

    menu_table.if_not_exists();
    order_table.if_not_exists();
    order_item_table.if_not_exists();

    db.execute(builder.build(&menu_table)).await?;
    db.execute(builder.build(&order_table)).await?;
    db.execute(builder.build(&order_item_table)).await?;

    Ok(())
}
