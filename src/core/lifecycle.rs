//! Purchase request lifecycle.
//!
//! A request and its items form one aggregate. [`PurchaseRequestAggregate`] owns
//! the state machine
//!
//! ```text
//! Pending --(first price applied)--> InProgress --(all items priced)--> Completed
//! ```
//!
//! and is the only code that writes `status` and `completed_at`. Item pricing is
//! delegated to [`LineItem`]. `Cancelled` exists in the stored enum but nothing
//! transitions into it.

use crate::{
    core::pricing::{self, LineItem, PriceUpdate},
    entities::{
        PurchaseRequest, PurchaseRequestItem, PurchaseRequestStatus, SoftDelete, purchase_request,
        purchase_request_item,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::Set, ConnectionTrait, IntoActiveModel, QueryOrder, prelude::*};
use std::collections::HashSet;

/// A status change performed by the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status before the change
    pub from: PurchaseRequestStatus,
    /// Status after the change
    pub to: PurchaseRequestStatus,
}

/// Result of pricing several items in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkPricing {
    /// Items that were priced, in first-seen order, without duplicates
    pub updated: Vec<i64>,
    /// Requested ids that are not live items of this request
    pub skipped: Vec<i64>,
    /// Status change triggered by the batch, if any
    pub transition: Option<Transition>,
}

/// Builds the row for a freshly raised request. New requests always start in `Pending`.
#[must_use]
pub fn new_request_model(
    request_number: String,
    supplier_id: i64,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> purchase_request::ActiveModel {
    purchase_request::ActiveModel {
        request_number: Set(request_number),
        supplier_id: Set(supplier_id),
        status: Set(PurchaseRequestStatus::Pending),
        request_date: Set(now),
        completed_at: Set(None),
        notes: Set(notes),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

/// Loads the live items of a request, ordered by id.
pub async fn active_items_for_request<C>(
    db: &C,
    request_id: i64,
) -> Result<Vec<purchase_request_item::Model>>
where
    C: ConnectionTrait,
{
    PurchaseRequestItem::find_active()
        .filter(purchase_request_item::Column::PurchaseRequestId.eq(request_id))
        .order_by_asc(purchase_request_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A purchase request together with its live items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequestAggregate {
    request: purchase_request::Model,
    items: Vec<LineItem>,
    request_dirty: bool,
}

impl PurchaseRequestAggregate {
    /// Assembles an aggregate from already-loaded rows.
    #[must_use]
    pub fn from_parts(
        request: purchase_request::Model,
        items: Vec<purchase_request_item::Model>,
    ) -> Self {
        Self {
            request,
            items: items.into_iter().map(LineItem::from_model).collect(),
            request_dirty: false,
        }
    }

    /// Loads a live request and its live items; `None` if the request is absent or deleted.
    pub async fn load<C>(db: &C, request_id: i64) -> Result<Option<Self>>
    where
        C: ConnectionTrait,
    {
        let Some(request) = PurchaseRequest::find_active_by_id(request_id)
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let items = active_items_for_request(db, request_id).await?;
        Ok(Some(Self::from_parts(request, items)))
    }

    /// Like [`Self::load`] but a missing request is an [`Error::NotFound`].
    pub async fn load_required<C>(db: &C, request_id: i64) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        Self::load(db, request_id)
            .await?
            .ok_or_else(|| Error::not_found("Purchase request", request_id))
    }

    /// Request identifier
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.request.id
    }

    /// Request number
    #[must_use]
    pub fn request_number(&self) -> &str {
        &self.request.request_number
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> PurchaseRequestStatus {
        self.request.status
    }

    /// Completion time, present only for completed requests
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.request.completed_at
    }

    /// Read-only view of the request row
    #[must_use]
    pub const fn request(&self) -> &purchase_request::Model {
        &self.request
    }

    /// Live (non-deleted) items, ordered by id
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| !item.is_deleted())
    }

    /// Looks up a live item of this request.
    #[must_use]
    pub fn item(&self, item_id: i64) -> Option<&LineItem> {
        self.items().find(|item| item.id() == item_id)
    }

    fn item_mut(&mut self, item_id: i64) -> Result<&mut LineItem> {
        let request_id = self.request.id;
        self.items
            .iter_mut()
            .find(|item| item.id() == item_id && !item.is_deleted())
            .ok_or_else(|| Error::NotFound {
                entity: "Purchase request item",
                id: format!("{item_id} in purchase request {request_id}"),
            })
    }

    /// Sum of `price * quantity` over priced items
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        pricing::total_price(&self.items)
    }

    /// Number of items missing a price or delivery date
    #[must_use]
    pub fn unpriced_count(&self) -> usize {
        pricing::unpriced_count(&self.items)
    }

    /// Whether there is at least one item and all items are priced
    #[must_use]
    pub fn all_priced(&self) -> bool {
        pricing::all_priced(&self.items)
    }

    /// Fails with [`Error::Conflict`] unless the request may still be modified.
    pub fn ensure_editable(&self) -> Result<()> {
        match self.request.status {
            PurchaseRequestStatus::Completed => Err(Error::conflict(format!(
                "cannot update a completed request ({})",
                self.request.request_number
            ))),
            PurchaseRequestStatus::Cancelled => Err(Error::conflict(format!(
                "cannot update a cancelled request ({})",
                self.request.request_number
            ))),
            PurchaseRequestStatus::Pending | PurchaseRequestStatus::InProgress => Ok(()),
        }
    }

    fn set_status(&mut self, to: PurchaseRequestStatus, now: DateTime<Utc>) -> Transition {
        let from = self.request.status;
        self.request.status = to;
        self.request.updated_at = now;
        self.request_dirty = true;
        Transition { from, to }
    }

    /// `Pending -> InProgress`. Any other starting status is a conflict.
    pub fn start_progress(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        if self.request.status != PurchaseRequestStatus::Pending {
            return Err(Error::conflict(format!(
                "only pending requests can be moved to in progress (current: {:?})",
                self.request.status
            )));
        }
        Ok(self.set_status(PurchaseRequestStatus::InProgress, now))
    }

    fn start_progress_if_pending(&mut self, now: DateTime<Utc>) -> Result<Option<Transition>> {
        if self.request.status == PurchaseRequestStatus::Pending {
            self.start_progress(now).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Prices one item. The first price on a pending request starts progress.
    ///
    /// Returns the status change, if one happened.
    pub fn update_item_price(
        &mut self,
        item_id: i64,
        price: Decimal,
        delivery_date: NaiveDate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<Transition>> {
        self.ensure_editable()?;
        self.item_mut(item_id)?
            .apply_price(price, delivery_date, today, now)?;
        self.start_progress_if_pending(now)
    }

    /// Prices several items at once.
    ///
    /// Ids that are not live items of this request are skipped and reported in
    /// [`BulkPricing::skipped`]; their price and date are never looked at. The
    /// remaining updates are all validated before anything changes, so an
    /// invalid price or date on a resolved item rejects the whole batch.
    pub fn apply_prices(
        &mut self,
        updates: &[PriceUpdate],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<BulkPricing> {
        self.ensure_editable()?;

        let mut outcome = BulkPricing::default();
        let mut resolved = Vec::with_capacity(updates.len());
        for update in updates {
            if self.item(update.item_id).is_some() {
                pricing::validate_update(update, today)?;
                resolved.push(update);
            } else {
                outcome.skipped.push(update.item_id);
            }
        }

        let mut seen = HashSet::new();
        for update in resolved {
            self.item_mut(update.item_id)?
                .apply_price(update.price, update.delivery_date, today, now)?;
            if seen.insert(update.item_id) {
                outcome.updated.push(update.item_id);
            }
        }

        if !outcome.updated.is_empty() {
            outcome.transition = self.start_progress_if_pending(now)?;
        }
        Ok(outcome)
    }

    /// Clears the pricing of one item. Status is left as it is.
    pub fn reset_item_pricing(&mut self, item_id: i64, now: DateTime<Utc>) -> Result<()> {
        self.ensure_editable()?;
        self.item_mut(item_id)?.reset_pricing(now);
        Ok(())
    }

    /// Soft-deletes one item of the request.
    pub fn remove_item(&mut self, item_id: i64, now: DateTime<Utc>) -> Result<()> {
        self.ensure_editable()?;
        self.item_mut(item_id)?.mark_deleted(now);
        Ok(())
    }

    /// Closes the request once every item carries a price and a delivery date.
    ///
    /// A request without items cannot be completed.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> Result<Transition> {
        match self.request.status {
            PurchaseRequestStatus::Completed => {
                return Err(Error::conflict(format!(
                    "purchase request {} is already completed",
                    self.request.request_number
                )));
            }
            PurchaseRequestStatus::Cancelled => {
                return Err(Error::conflict(format!(
                    "purchase request {} is cancelled",
                    self.request.request_number
                )));
            }
            PurchaseRequestStatus::Pending | PurchaseRequestStatus::InProgress => {}
        }

        if self.items().next().is_none() {
            return Err(Error::validation(
                "items",
                "request has no items; at least one priced item is required",
            ));
        }
        let unpriced = self.unpriced_count();
        if unpriced > 0 {
            return Err(Error::validation(
                "items",
                format!(
                    "all items must be priced before completion; {unpriced} item(s) missing price or delivery date"
                ),
            ));
        }

        let transition = self.set_status(PurchaseRequestStatus::Completed, now);
        self.request.completed_at = Some(now);
        Ok(transition)
    }

    /// Writes the changed request row and changed items.
    ///
    /// Run it inside a transaction so the whole aggregate lands at once.
    pub async fn persist<C>(&mut self, db: &C) -> Result<()>
    where
        C: ConnectionTrait,
    {
        if self.request_dirty {
            let mut active = self.request.clone().into_active_model();
            active.status = Set(self.request.status);
            active.completed_at = Set(self.request.completed_at);
            active.updated_at = Set(self.request.updated_at);
            active.update(db).await?;
            self.request_dirty = false;
        }

        for item in self.items.iter_mut().filter(|item| item.is_dirty()) {
            item.to_update_model().update(db).await?;
            item.mark_clean();
        }
        Ok(())
    }
}
