//! Database configuration module for the supplier portal.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models,
//! including the unique request-number index and the cascading item foreign key.

use crate::entities::{Account, PurchaseRequest, PurchaseRequestItem, SupplierProfile};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/supplier_portal.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
#[instrument]
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table_for<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Creates all tables, parents before children, skipping tables that already exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table_for(db, Account).await?;
    create_table_for(db, SupplierProfile).await?;
    create_table_for(db, PurchaseRequest).await?;
    create_table_for(db, PurchaseRequestItem).await?;
    info!("Database tables ensured");
    Ok(())
}
