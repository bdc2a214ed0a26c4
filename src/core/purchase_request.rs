//! Purchase request business logic - creation, queries and the request-level workflow.
//!
//! State changes go through [`PurchaseRequestAggregate`] inside a database
//! transaction, so a request and its items are always written together.

use crate::{
    core::{
        lifecycle::{self, PurchaseRequestAggregate},
        numbering,
        pricing::{self, MAX_AMOUNT},
        supplier,
        views::{CompletedPurchaseRequestView, PurchaseRequestView},
    },
    entities::{
        PurchaseRequest, PurchaseRequestItem, PurchaseRequestStatus, SoftDelete, purchase_request,
        purchase_request_item,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

const MAX_PRODUCT_NAME_LEN: usize = 200;
const MAX_UNIT_LEN: usize = 20;
const MAX_NOTES_LEN: usize = 1000;
const CREATE_ATTEMPTS: usize = 2;

/// One line of a new purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseRequestItem {
    /// Product name
    pub product_name: String,
    /// Requested quantity
    pub quantity: Decimal,
    /// Unit of measure
    pub unit: String,
}

/// Input for [`create_purchase_request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseRequest {
    /// Supplier account the request is addressed to
    pub supplier_id: i64,
    /// Optional notes for the supplier
    pub notes: Option<String>,
    /// Requested items, at least one
    pub items: Vec<NewPurchaseRequestItem>,
}

fn validate_new_item(item: &NewPurchaseRequestItem) -> Result<()> {
    let name = item.product_name.trim();
    if name.is_empty() {
        return Err(Error::validation("product_name", "Product name is required"));
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(Error::validation(
            "product_name",
            format!("Product name cannot exceed {MAX_PRODUCT_NAME_LEN} characters"),
        ));
    }
    if item.quantity <= Decimal::ZERO {
        return Err(Error::validation(
            "quantity",
            format!("Quantity must be greater than 0. Provided: {}", item.quantity),
        ));
    }
    if item.quantity > MAX_AMOUNT {
        return Err(Error::validation(
            "quantity",
            format!("Quantity is too large. Provided: {}", item.quantity),
        ));
    }
    let unit = item.unit.trim();
    if unit.is_empty() {
        return Err(Error::validation("unit", "Unit is required"));
    }
    if unit.chars().count() > MAX_UNIT_LEN {
        return Err(Error::validation(
            "unit",
            format!("Unit cannot exceed {MAX_UNIT_LEN} characters"),
        ));
    }
    Ok(())
}

fn validate_new_request(new: &NewPurchaseRequest) -> Result<()> {
    if new.supplier_id <= 0 {
        return Err(Error::validation(
            "supplier_id",
            format!("Valid supplier ID is required. Provided: {}", new.supplier_id),
        ));
    }
    if new.items.is_empty() {
        return Err(Error::validation(
            "items",
            "Purchase request must contain at least one item",
        ));
    }
    if new
        .notes
        .as_ref()
        .is_some_and(|notes| notes.chars().count() > MAX_NOTES_LEN)
    {
        return Err(Error::validation(
            "notes",
            format!("Notes cannot exceed {MAX_NOTES_LEN} characters"),
        ));
    }
    new.items.iter().try_for_each(validate_new_item)
}

async fn insert_request(
    db: &DatabaseConnection,
    new: &NewPurchaseRequest,
) -> Result<(purchase_request::Model, Vec<purchase_request_item::Model>)> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let request_number = numbering::generate_request_number(&txn, now.year()).await?;
    let notes = new
        .notes
        .as_ref()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let request = lifecycle::new_request_model(request_number.clone(), new.supplier_id, notes, now)
        .insert(&txn)
        .await
        .map_err(|e| Error::from_insert(e, &request_number))?;

    let mut items = Vec::with_capacity(new.items.len());
    for item in &new.items {
        let model = purchase_request_item::ActiveModel {
            purchase_request_id: Set(request.id),
            product_name: Set(item.product_name.trim().to_string()),
            quantity: Set(item.quantity),
            unit: Set(item.unit.trim().to_string()),
            price: Set(None),
            delivery_date: Set(None),
            is_priced: Set(false),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(model);
    }

    txn.commit().await?;
    Ok((request, items))
}

/// Raises a new purchase request for a supplier.
///
/// The request starts in `Pending` with every item unpriced. Its number is
/// generated inside the same transaction as the insert; if a concurrent writer
/// takes the same number, the number is regenerated once.
///
/// # Errors
/// - [`Error::Validation`] for an empty item list or malformed items
/// - [`Error::NotFound`] if the supplier does not exist
/// - [`Error::UniqueConflict`] if the number collides twice in a row
#[instrument(skip(db, new), fields(supplier_id = new.supplier_id, items = new.items.len()))]
pub async fn create_purchase_request(
    db: &DatabaseConnection,
    new: NewPurchaseRequest,
) -> Result<PurchaseRequestView> {
    validate_new_request(&new)?;

    let supplier = supplier::find_supplier_account(db, new.supplier_id)
        .await?
        .ok_or_else(|| Error::not_found("Supplier", new.supplier_id))?;

    let mut attempt = 1;
    let (request, items) = loop {
        match insert_request(db, &new).await {
            Err(e) if e.is_retryable() && attempt < CREATE_ATTEMPTS => {
                warn!("Request number collision ({}), regenerating", e);
                attempt += 1;
            }
            other => break other?,
        }
    };

    info!(
        "Purchase request created: {} for supplier {}",
        request.request_number, supplier.id
    );
    let title = supplier::profiles_by_account(db, [supplier.id])
        .await?
        .remove(&supplier.id)
        .map(|p| p.title)
        .unwrap_or_default();
    Ok(PurchaseRequestView::new(&request, &items, title))
}

async fn build_views(
    db: &DatabaseConnection,
    requests: Vec<purchase_request::Model>,
) -> Result<Vec<PurchaseRequestView>> {
    if requests.is_empty() {
        return Ok(Vec::new());
    }
    let mut items = items_by_request(db, requests.iter().map(|r| r.id)).await?;
    let profiles = supplier::profiles_by_account(db, requests.iter().map(|r| r.supplier_id)).await?;

    Ok(requests
        .iter()
        .map(|request| {
            let request_items = items.remove(&request.id).unwrap_or_default();
            let title = profiles
                .get(&request.supplier_id)
                .map(|p| p.title.clone())
                .unwrap_or_default();
            PurchaseRequestView::new(request, &request_items, title)
        })
        .collect())
}

async fn items_by_request(
    db: &DatabaseConnection,
    request_ids: impl Iterator<Item = i64>,
) -> Result<HashMap<i64, Vec<purchase_request_item::Model>>> {
    let ids: Vec<i64> = request_ids.collect();
    let items = PurchaseRequestItem::find_active()
        .filter(purchase_request_item::Column::PurchaseRequestId.is_in(ids))
        .order_by_asc(purchase_request_item::Column::Id)
        .all(db)
        .await?;

    let mut grouped: HashMap<i64, Vec<purchase_request_item::Model>> = HashMap::new();
    for item in items {
        grouped.entry(item.purchase_request_id).or_default().push(item);
    }
    Ok(grouped)
}

/// Retrieves a live purchase request with its live items, returning None if
/// it does not exist or was deleted.
///
/// The view carries the supplier's company name taken from their profile.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_purchase_request(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Option<PurchaseRequestView>> {
    let request = PurchaseRequest::find_active_by_id(request_id).one(db).await?;
    debug!("Lookup purchase request {}: found = {}", request_id, request.is_some());
    Ok(build_views(db, request.into_iter().collect()).await?.pop())
}

/// Retrieves a purchase request only if it is addressed to `supplier_id`.
///
/// Used when a supplier opens a request, so one supplier never sees another's.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_purchase_request_for_supplier(
    db: &DatabaseConnection,
    request_id: i64,
    supplier_id: i64,
) -> Result<Option<PurchaseRequestView>> {
    Ok(get_purchase_request(db, request_id)
        .await?
        .filter(|view| view.supplier_id == supplier_id))
}

/// Retrieves a live purchase request by its `PR-<year>-<sequence>` number.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_purchase_request_by_number(
    db: &DatabaseConnection,
    request_number: &str,
) -> Result<Option<PurchaseRequestView>> {
    let request = PurchaseRequest::find_active()
        .filter(purchase_request::Column::RequestNumber.eq(request_number))
        .one(db)
        .await?;
    Ok(build_views(db, request.into_iter().collect()).await?.pop())
}

/// Lists the live requests addressed to a supplier, oldest first.
///
/// Each view includes the request's live items.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_by_supplier(
    db: &DatabaseConnection,
    supplier_id: i64,
) -> Result<Vec<PurchaseRequestView>> {
    let requests = PurchaseRequest::find_active()
        .filter(purchase_request::Column::SupplierId.eq(supplier_id))
        .order_by_asc(purchase_request::Column::Id)
        .all(db)
        .await?;
    build_views(db, requests).await
}

/// Lists the live requests in `status`, oldest first.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_by_status(
    db: &DatabaseConnection,
    status: PurchaseRequestStatus,
) -> Result<Vec<PurchaseRequestView>> {
    let requests = PurchaseRequest::find_active()
        .filter(purchase_request::Column::Status.eq(status))
        .order_by_asc(purchase_request::Column::Id)
        .all(db)
        .await?;
    build_views(db, requests).await
}

/// Lists requests still waiting for their first price.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_pending(db: &DatabaseConnection) -> Result<Vec<PurchaseRequestView>> {
    list_by_status(db, PurchaseRequestStatus::Pending).await
}

/// Lists completed requests, most recently completed first.
///
/// Each entry carries the supplier code and title, the completion time and the
/// priced items, ready for the purchasing department.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_completed(db: &DatabaseConnection) -> Result<Vec<CompletedPurchaseRequestView>> {
    let requests = PurchaseRequest::find_active()
        .filter(purchase_request::Column::Status.eq(PurchaseRequestStatus::Completed))
        .order_by_desc(purchase_request::Column::CompletedAt)
        .order_by_desc(purchase_request::Column::Id)
        .all(db)
        .await?;
    let profiles = supplier::profiles_by_account(db, requests.iter().map(|r| r.supplier_id)).await?;

    Ok(build_views(db, requests)
        .await?
        .into_iter()
        .filter_map(|view| {
            let completed_at = view.completed_at?;
            let profile = profiles.get(&view.supplier_id);
            Some(CompletedPurchaseRequestView {
                id: view.id,
                request_number: view.request_number,
                supplier_code: profile.map(|p| p.code.clone()).unwrap_or_default(),
                supplier_title: view.supplier_title,
                completed_at,
                items: view.items,
            })
        })
        .collect())
}

/// Prices one item of a request.
///
/// The first price on a `Pending` request moves it to `InProgress`.
///
/// # Errors
/// - [`Error::NotFound`] if the request or the item within it does not exist
/// - [`Error::Conflict`] if the request is completed
/// - [`Error::Validation`] for a negative price or a past delivery date
#[instrument(skip(db))]
pub async fn update_item_price(
    db: &DatabaseConnection,
    request_id: i64,
    item_id: i64,
    price: Decimal,
    delivery_date: NaiveDate,
) -> Result<()> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let mut aggregate = PurchaseRequestAggregate::load_required(&txn, request_id).await?;
    let transition =
        aggregate.update_item_price(item_id, price, delivery_date, now.date_naive(), now)?;
    aggregate.persist(&txn).await?;
    txn.commit().await?;

    if let Some(transition) = transition {
        info!(
            "Purchase request {} moved {:?} -> {:?}",
            aggregate.request_number(),
            transition.from,
            transition.to
        );
    }
    info!("Item {} updated in request {}", item_id, request_id);
    Ok(())
}

/// Marks a request completed once every item is priced.
///
/// # Errors
/// - [`Error::NotFound`] if the request does not exist
/// - [`Error::Conflict`] if it is already completed
/// - [`Error::Validation`] if it has no items or any item is unpriced
#[instrument(skip(db))]
pub async fn complete_request(db: &DatabaseConnection, request_id: i64) -> Result<()> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let mut aggregate = PurchaseRequestAggregate::load_required(&txn, request_id).await?;
    aggregate.mark_completed(now)?;
    aggregate.persist(&txn).await?;
    txn.commit().await?;

    info!("Purchase request completed: {}", aggregate.request_number());
    Ok(())
}

/// Total value of a request's priced items.
///
/// Unpriced items contribute nothing; an unknown request totals zero.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn request_total(db: &DatabaseConnection, request_id: i64) -> Result<Decimal> {
    let items: Vec<_> = lifecycle::active_items_for_request(db, request_id)
        .await?
        .into_iter()
        .map(pricing::LineItem::from_model)
        .collect();
    Ok(pricing::total_price(&items))
}
