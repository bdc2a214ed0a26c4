//! Item-level operations.
//!
//! Reads go straight to the item table. Writes resolve the parent request and
//! go through [`PurchaseRequestAggregate`], so a completed request stays frozen
//! no matter which entry point is used.

use crate::{
    core::{
        lifecycle::{self, PurchaseRequestAggregate},
        pricing::{self, LineItem, PriceUpdate},
        views::PurchaseRequestItemView,
    },
    entities::{PurchaseRequestItem, SoftDelete, purchase_request_item},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};

async fn line_items(db: &DatabaseConnection, request_id: i64) -> Result<Vec<LineItem>> {
    Ok(lifecycle::active_items_for_request(db, request_id)
        .await?
        .into_iter()
        .map(LineItem::from_model)
        .collect())
}

async fn require_item(db: &DatabaseConnection, item_id: i64) -> Result<purchase_request_item::Model> {
    PurchaseRequestItem::find_active_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Purchase request item", item_id))
}

/// Retrieves a live item by id, returning None if it does not exist or was deleted.
///
/// The item is returned on its own; use [`list_items`] to see it alongside the
/// rest of its request.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_item(
    db: &DatabaseConnection,
    item_id: i64,
) -> Result<Option<PurchaseRequestItemView>> {
    let item = PurchaseRequestItem::find_active_by_id(item_id).one(db).await?;
    Ok(item.as_ref().map(PurchaseRequestItemView::from))
}

/// Lists the live items of a request, ordered by id.
///
/// An unknown or deleted request simply yields an empty list.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_items(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Vec<PurchaseRequestItemView>> {
    let items = lifecycle::active_items_for_request(db, request_id).await?;
    Ok(items.iter().map(PurchaseRequestItemView::from).collect())
}

/// Lists items of a request still missing a price or delivery date.
///
/// These are the items a supplier has to quote before the request can be completed.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_unpriced(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Vec<PurchaseRequestItemView>> {
    let items = lifecycle::active_items_for_request(db, request_id).await?;
    Ok(items
        .iter()
        .filter(|item| !item.is_priced)
        .map(PurchaseRequestItemView::from)
        .collect())
}

/// Lists items of a request carrying both a price and a delivery date.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_priced(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Vec<PurchaseRequestItemView>> {
    let items = lifecycle::active_items_for_request(db, request_id).await?;
    Ok(items
        .iter()
        .filter(|item| item.is_priced)
        .map(PurchaseRequestItemView::from)
        .collect())
}

/// Prices a single item addressed by its own id.
///
/// # Errors
/// - [`Error::NotFound`] if the item or its request does not exist
/// - [`Error::Conflict`] if the parent request is completed
/// - [`Error::Validation`] for a negative price or a past delivery date
#[instrument(skip(db))]
pub async fn update_item_price(
    db: &DatabaseConnection,
    item_id: i64,
    price: Decimal,
    delivery_date: NaiveDate,
) -> Result<PurchaseRequestItemView> {
    let request_id = require_item(db, item_id).await?.purchase_request_id;
    let now = Utc::now();

    let txn = db.begin().await?;
    let mut aggregate = PurchaseRequestAggregate::load_required(&txn, request_id).await?;
    aggregate.update_item_price(item_id, price, delivery_date, now.date_naive(), now)?;
    aggregate.persist(&txn).await?;
    txn.commit().await?;

    info!("Item {} priced at {} for {}", item_id, price, delivery_date);
    aggregate
        .item(item_id)
        .map(PurchaseRequestItemView::from)
        .ok_or_else(|| Error::not_found("Purchase request item", item_id))
}

/// Prices several items of one request in a single transaction.
///
/// Invalid prices or dates reject the whole batch. Ids that are not live items
/// of the request are skipped with a warning. Returns only the items that were
/// actually updated.
///
/// # Errors
/// - [`Error::Validation`] for an empty batch or any invalid update
/// - [`Error::NotFound`] if the request does not exist
/// - [`Error::Conflict`] if the request is completed
#[instrument(skip(db, updates), fields(updates = updates.len()))]
pub async fn bulk_update_items(
    db: &DatabaseConnection,
    request_id: i64,
    updates: &[PriceUpdate],
) -> Result<Vec<PurchaseRequestItemView>> {
    if updates.is_empty() {
        return Err(Error::validation("updates", "At least one item update is required"));
    }
    let now = Utc::now();

    let txn = db.begin().await?;
    let mut aggregate = PurchaseRequestAggregate::load_required(&txn, request_id).await?;
    let outcome = aggregate.apply_prices(updates, now.date_naive(), now)?;
    aggregate.persist(&txn).await?;
    txn.commit().await?;

    for skipped in &outcome.skipped {
        warn!(
            "Item {} is not a live item of request {}, skipped",
            skipped, request_id
        );
    }
    if let Some(transition) = outcome.transition {
        info!(
            "Purchase request {} moved {:?} -> {:?}",
            aggregate.request_number(),
            transition.from,
            transition.to
        );
    }
    info!(
        "Bulk pricing on request {}: {} updated, {} skipped",
        request_id,
        outcome.updated.len(),
        outcome.skipped.len()
    );

    Ok(outcome
        .updated
        .iter()
        .filter_map(|id| aggregate.item(*id))
        .map(PurchaseRequestItemView::from)
        .collect())
}

/// Sum of `price * quantity` over the priced items of a request.
///
/// Unpriced items contribute nothing, so a partly quoted request reports the
/// value quoted so far.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn total_price(db: &DatabaseConnection, request_id: i64) -> Result<Decimal> {
    Ok(pricing::total_price(&line_items(db, request_id).await?))
}

/// Whether the request has at least one item and every item is priced.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn all_priced(db: &DatabaseConnection, request_id: i64) -> Result<bool> {
    Ok(pricing::all_priced(&line_items(db, request_id).await?))
}

/// Number of live items still missing a price or delivery date.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn unpriced_count(db: &DatabaseConnection, request_id: i64) -> Result<usize> {
    Ok(pricing::unpriced_count(&line_items(db, request_id).await?))
}

/// Clears the price and delivery date of an item and marks it unpriced.
///
/// The status of the parent request is left as it is.
///
/// # Errors
/// - [`Error::NotFound`] if the item or its request does not exist
/// - [`Error::Conflict`] if the parent request is completed
#[instrument(skip(db))]
pub async fn reset_pricing(db: &DatabaseConnection, item_id: i64) -> Result<PurchaseRequestItemView> {
    let request_id = require_item(db, item_id).await?.purchase_request_id;
    let now = Utc::now();

    let txn = db.begin().await?;
    let mut aggregate = PurchaseRequestAggregate::load_required(&txn, request_id).await?;
    aggregate.reset_item_pricing(item_id, now)?;
    aggregate.persist(&txn).await?;
    txn.commit().await?;

    info!("Pricing reset for item {}", item_id);
    aggregate
        .item(item_id)
        .map(PurchaseRequestItemView::from)
        .ok_or_else(|| Error::not_found("Purchase request item", item_id))
}

/// Soft-deletes an item. It disappears from every listing and total.
///
/// # Errors
/// - [`Error::NotFound`] if the item or its request does not exist
/// - [`Error::Conflict`] if the parent request is completed
#[instrument(skip(db))]
pub async fn delete_item(db: &DatabaseConnection, item_id: i64) -> Result<()> {
    let request_id = require_item(db, item_id).await?.purchase_request_id;
    let now = Utc::now();

    let txn = db.begin().await?;
    let mut aggregate = PurchaseRequestAggregate::load_required(&txn, request_id).await?;
    aggregate.remove_item(item_id, now)?;
    aggregate.persist(&txn).await?;
    txn.commit().await?;

    info!("Item {} deleted from request {}", item_id, request_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::purchase_request::{self, NewPurchaseRequest},
        entities::PurchaseRequestStatus,
        test_utils::*,
    };
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn in_days(days: i64) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(days)
    }

    #[tokio::test]
    async fn test_bulk_update_skips_unknown_ids() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = create_test_request(&db, supplier.id, 2).await?;
        let item_id = request.items[0].id;

        let updated = bulk_update_items(
            &db,
            request.id,
            &[
                PriceUpdate {
                    item_id,
                    price: dec!(12.5),
                    delivery_date: in_days(3),
                },
                PriceUpdate {
                    item_id: 9_999,
                    price: dec!(1),
                    delivery_date: in_days(3),
                },
            ],
        )
        .await?;

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, item_id);
        assert_eq!(updated[0].price, Some(dec!(12.5)));
        assert!(updated[0].is_priced);

        let request = purchase_request::get_purchase_request(&db, request.id)
            .await?
            .unwrap();
        assert_eq!(request.status, PurchaseRequestStatus::InProgress);
        assert_eq!(unpriced_count(&db, request.id).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_update_skips_unknown_id_with_invalid_price() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = create_test_request(&db, supplier.id, 1).await?;
        let item_id = request.items[0].id;

        let updated = bulk_update_items(
            &db,
            request.id,
            &[
                PriceUpdate {
                    item_id,
                    price: dec!(5),
                    delivery_date: in_days(1),
                },
                PriceUpdate {
                    item_id: 9_999,
                    price: dec!(-1),
                    delivery_date: in_days(1),
                },
            ],
        )
        .await?;

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, item_id);
        assert_eq!(unpriced_count(&db, request.id).await?, 0);
        assert!(all_priced(&db, request.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_update_rejects_whole_batch_on_invalid_price() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = create_test_request(&db, supplier.id, 2).await?;

        let result = bulk_update_items(
            &db,
            request.id,
            &[
                PriceUpdate {
                    item_id: request.items[0].id,
                    price: dec!(5),
                    delivery_date: in_days(1),
                },
                PriceUpdate {
                    item_id: request.items[1].id,
                    price: dec!(-1),
                    delivery_date: in_days(1),
                },
            ],
        )
        .await;

        assert!(matches!(result, Err(Error::Validation { field: "price", .. })));
        assert_eq!(list_unpriced(&db, request.id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_update_empty_is_validation_error() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = create_test_request(&db, supplier.id, 1).await?;

        let result = bulk_update_items(&db, request.id, &[]).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_total_price_counts_only_priced_items() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = purchase_request::create_purchase_request(
            &db,
            NewPurchaseRequest {
                supplier_id: supplier.id,
                notes: None,
                items: vec![
                    new_item("Bolts", dec!(2), "pcs"),
                    new_item("Nuts", dec!(5), "pcs"),
                ],
            },
        )
        .await?;

        update_item_price(&db, request.items[0].id, dec!(10), in_days(0)).await?;

        assert_eq!(total_price(&db, request.id).await?, dec!(20));
        assert!(!all_priced(&db, request.id).await?);
        assert_eq!(unpriced_count(&db, request.id).await?, 1);
        assert_eq!(list_priced(&db, request.id).await?.len(), 1);
        assert_eq!(list_unpriced(&db, request.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_pricing_clears_fields() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = create_test_request(&db, supplier.id, 1).await?;
        let item_id = request.items[0].id;

        update_item_price(&db, item_id, dec!(7), in_days(2)).await?;
        let reset = reset_pricing(&db, item_id).await?;

        assert!(!reset.is_priced);
        assert!(reset.price.is_none());
        assert!(reset.delivery_date.is_none());

        let stored = get_item(&db, item_id).await?.unwrap();
        assert_eq!(stored, reset);

        let request = purchase_request::get_purchase_request(&db, request.id)
            .await?
            .unwrap();
        assert_eq!(request.status, PurchaseRequestStatus::InProgress);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item_hides_it() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = create_test_request(&db, supplier.id, 2).await?;
        let deleted_id = request.items[0].id;

        delete_item(&db, deleted_id).await?;

        assert!(get_item(&db, deleted_id).await?.is_none());
        let remaining = list_items(&db, request.id).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, request.items[1].id);

        let again = delete_item(&db, deleted_id).await;
        assert!(matches!(again, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_item_writes_blocked_after_completion() -> Result<()> {
        let (db, supplier) = setup_with_supplier().await?;
        let request = create_test_request(&db, supplier.id, 1).await?;
        let item_id = request.items[0].id;

        update_item_price(&db, item_id, dec!(3), in_days(5)).await?;
        purchase_request::complete_request(&db, request.id).await?;

        let price = update_item_price(&db, item_id, dec!(4), in_days(5)).await;
        assert!(matches!(price, Err(Error::Conflict { .. })));
        let reset = reset_pricing(&db, item_id).await;
        assert!(matches!(reset, Err(Error::Conflict { .. })));
        let delete = delete_item(&db, item_id).await;
        assert!(matches!(delete, Err(Error::Conflict { .. })));
        let bulk = bulk_update_items(
            &db,
            request.id,
            &[PriceUpdate {
                item_id,
                price: dec!(4),
                delivery_date: in_days(5),
            }],
        )
        .await;
        assert!(matches!(bulk, Err(Error::Conflict { .. })));

        let item = get_item(&db, item_id).await?.unwrap();
        assert_eq!(item.price, Some(dec!(3)));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_item_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_item_price(&db, 42, dec!(1), in_days(1)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(get_item(&db, 42).await?.is_none());
        Ok(())
    }
}
