//! Item pricing engine.
//!
//! [`LineItem`] wraps a stored item row and is the only place that writes the
//! pricing columns. `price` and `delivery_date` are always set or cleared
//! together, so `is_priced` never disagrees with them.

use crate::{
    entities::purchase_request_item,
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::Set, IntoActiveModel};
use serde::{Deserialize, Serialize};

/// Largest accepted price or quantity: 999999.9999
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 4);

/// A requested price and delivery date for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Item to price
    pub item_id: i64,
    /// Unit price
    pub price: Decimal,
    /// Promised delivery date
    pub delivery_date: NaiveDate,
}

/// Rejects negative or oversized prices.
pub fn validate_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(Error::validation(
            "price",
            format!("Price cannot be negative. Provided: {price}"),
        ));
    }
    if price > MAX_AMOUNT {
        return Err(Error::validation(
            "price",
            format!("Price is too large. Provided: {price}, maximum: {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}

/// Rejects delivery dates before `today`.
pub fn validate_delivery_date(delivery_date: NaiveDate, today: NaiveDate) -> Result<()> {
    if delivery_date < today {
        return Err(Error::validation(
            "delivery_date",
            format!(
                "Delivery date cannot be in the past. Provided: {}, Current: {}",
                delivery_date.format("%Y-%m-%d"),
                today.format("%Y-%m-%d")
            ),
        ));
    }
    Ok(())
}

/// Validates both halves of a price update.
pub fn validate_update(update: &PriceUpdate, today: NaiveDate) -> Result<()> {
    validate_price(update.price)?;
    validate_delivery_date(update.delivery_date, today)
}

/// A purchase request item with encapsulated pricing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    model: purchase_request_item::Model,
    dirty: bool,
}

impl LineItem {
    /// Wraps a stored row.
    #[must_use]
    pub fn from_model(model: purchase_request_item::Model) -> Self {
        Self {
            model,
            dirty: false,
        }
    }

    /// Item identifier
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.model.id
    }

    /// Quoted unit price, if priced
    #[must_use]
    pub const fn price(&self) -> Option<Decimal> {
        self.model.price
    }

    /// Promised delivery date, if priced
    #[must_use]
    pub const fn delivery_date(&self) -> Option<NaiveDate> {
        self.model.delivery_date
    }

    /// Whether both price and delivery date are set
    #[must_use]
    pub const fn is_priced(&self) -> bool {
        self.model.is_priced
    }

    /// Whether the item has been soft-deleted in this unit of work
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.model.is_deleted
    }

    /// Whether the item changed since it was loaded
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read-only view of the underlying row
    #[must_use]
    pub const fn model(&self) -> &purchase_request_item::Model {
        &self.model
    }

    /// `price * quantity` for a priced item, zero otherwise.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        match (self.model.is_priced, self.model.price) {
            (true, Some(price)) => price * self.model.quantity,
            _ => Decimal::ZERO,
        }
    }

    /// Sets price and delivery date together and marks the item priced.
    ///
    /// On a validation failure the item is left untouched. Re-applying the
    /// same values yields the same state.
    pub fn apply_price(
        &mut self,
        price: Decimal,
        delivery_date: NaiveDate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        validate_price(price)?;
        validate_delivery_date(delivery_date, today)?;

        self.model.price = Some(price);
        self.model.delivery_date = Some(delivery_date);
        self.model.is_priced = true;
        self.touch(now);
        Ok(())
    }

    /// Clears price and delivery date and marks the item unpriced.
    pub fn reset_pricing(&mut self, now: DateTime<Utc>) {
        self.model.price = None;
        self.model.delivery_date = None;
        self.model.is_priced = false;
        self.touch(now);
    }

    pub(crate) fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.model.is_deleted = true;
        self.touch(now);
    }

    pub(crate) const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.model.updated_at = now;
        self.dirty = true;
    }

    /// Active model that writes back only the columns this engine owns.
    #[must_use]
    pub fn to_update_model(&self) -> purchase_request_item::ActiveModel {
        let mut active = self.model.clone().into_active_model();
        active.price = Set(self.model.price);
        active.delivery_date = Set(self.model.delivery_date);
        active.is_priced = Set(self.model.is_priced);
        active.is_deleted = Set(self.model.is_deleted);
        active.updated_at = Set(self.model.updated_at);
        active
    }
}

/// Sum of `price * quantity` over priced, non-deleted items.
#[must_use]
pub fn total_price(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .filter(|item| !item.is_deleted())
        .map(LineItem::line_total)
        .sum()
}

/// Number of non-deleted items still missing a price or delivery date.
#[must_use]
pub fn unpriced_count(items: &[LineItem]) -> usize {
    items
        .iter()
        .filter(|item| !item.is_deleted() && !item.is_priced())
        .count()
}

/// True when at least one non-deleted item exists and every one is priced.
#[must_use]
pub fn all_priced(items: &[LineItem]) -> bool {
    let mut live = items.iter().filter(|item| !item.is_deleted()).peekable();
    live.peek().is_some() && live.all(LineItem::is_priced)
}
