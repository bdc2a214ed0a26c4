//! Shared test utilities for the supplier portal.
//!
//! This module provides common helper functions for setting up test databases
//! and creating suppliers and purchase requests with sensible defaults.

use crate::{
    config::settings::NotificationSettings,
    core::{
        notify::TracingNotifier,
        purchase_request::{self, NewPurchaseRequest, NewPurchaseRequestItem},
        supplier::{self, NewSupplier, SupplierView},
        views::PurchaseRequestView,
    },
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds supplier input with sensible defaults.
///
/// # Defaults
/// * `title`: `"<code> Trading"`
/// * `email`: `"<username>@suppliers.test"`
/// * `phone`: `"+1 555 0100"`
/// * `address`: `"1 Warehouse Road"`
pub fn new_supplier(code: &str, username: &str) -> NewSupplier {
    NewSupplier {
        code: code.to_string(),
        title: format!("{code} Trading"),
        username: username.to_string(),
        email: format!("{username}@suppliers.test"),
        phone: "+1 555 0100".to_string(),
        address: "1 Warehouse Road".to_string(),
    }
}

/// Creates a supplier account and profile, discarding the onboarding email.
pub async fn create_test_supplier(
    db: &DatabaseConnection,
    code: &str,
    username: &str,
) -> Result<SupplierView> {
    supplier::create_supplier(
        db,
        new_supplier(code, username),
        &TracingNotifier::default(),
        &NotificationSettings::default(),
    )
    .await
}

/// Builds one request line.
pub fn new_item(product_name: &str, quantity: Decimal, unit: &str) -> NewPurchaseRequestItem {
    NewPurchaseRequestItem {
        product_name: product_name.to_string(),
        quantity,
        unit: unit.to_string(),
    }
}

/// Creates a purchase request with `item_count` items.
///
/// # Defaults
/// * products: `"Product 1"`, `"Product 2"`, ...
/// * quantity: 1 `"pcs"` each
/// * notes: None
pub async fn create_test_request(
    db: &DatabaseConnection,
    supplier_id: i64,
    item_count: usize,
) -> Result<PurchaseRequestView> {
    let items = (1..=item_count)
        .map(|n| new_item(&format!("Product {n}"), Decimal::ONE, "pcs"))
        .collect();
    purchase_request::create_purchase_request(
        db,
        NewPurchaseRequest {
            supplier_id,
            notes: None,
            items,
        },
    )
    .await
}

/// Sets up a complete test environment with one supplier.
/// Returns (db, supplier) for request-related tests.
pub async fn setup_with_supplier() -> Result<(DatabaseConnection, SupplierView)> {
    let db = setup_test_db().await?;
    let supplier = create_test_supplier(&db, "ACME", "acme_supplier").await?;
    Ok((db, supplier))
}
