//! Read models returned to callers.
//!
//! Views are plain serializable structs detached from the database rows, so the
//! caller can render them without touching the aggregate.

use crate::{
    core::pricing::LineItem,
    entities::{PurchaseRequestStatus, purchase_request, purchase_request_item},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a purchase request as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestItemView {
    /// Item identifier
    pub id: i64,
    /// Parent request
    pub purchase_request_id: i64,
    /// Product name
    pub product_name: String,
    /// Requested quantity
    pub quantity: Decimal,
    /// Unit of measure
    pub unit: String,
    /// Quoted unit price
    pub price: Option<Decimal>,
    /// Promised delivery date
    pub delivery_date: Option<NaiveDate>,
    /// Whether price and delivery date are both set
    pub is_priced: bool,
}

impl From<&purchase_request_item::Model> for PurchaseRequestItemView {
    fn from(model: &purchase_request_item::Model) -> Self {
        Self {
            id: model.id,
            purchase_request_id: model.purchase_request_id,
            product_name: model.product_name.clone(),
            quantity: model.quantity,
            unit: model.unit.clone(),
            price: model.price,
            delivery_date: model.delivery_date,
            is_priced: model.is_priced,
        }
    }
}

impl From<&LineItem> for PurchaseRequestItemView {
    fn from(item: &LineItem) -> Self {
        Self::from(item.model())
    }
}

/// A purchase request with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestView {
    /// Request identifier
    pub id: i64,
    /// `PR-<year>-<sequence>`
    pub request_number: String,
    /// Supplier account
    pub supplier_id: i64,
    /// Supplier company name, empty if the supplier has no profile
    pub supplier_title: String,
    /// Current status
    pub status: PurchaseRequestStatus,
    /// When the request was raised
    pub request_date: DateTime<Utc>,
    /// When the request was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Notes for the supplier
    pub notes: Option<String>,
    /// Live items, ordered by id
    pub items: Vec<PurchaseRequestItemView>,
}

impl PurchaseRequestView {
    /// Builds a view from a request row, its live items and the supplier title.
    #[must_use]
    pub fn new(
        request: &purchase_request::Model,
        items: &[purchase_request_item::Model],
        supplier_title: String,
    ) -> Self {
        Self {
            id: request.id,
            request_number: request.request_number.clone(),
            supplier_id: request.supplier_id,
            supplier_title,
            status: request.status,
            request_date: request.request_date,
            completed_at: request.completed_at,
            notes: request.notes.clone(),
            items: items.iter().map(PurchaseRequestItemView::from).collect(),
        }
    }

    /// Sum of `price * quantity` over priced items.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .filter_map(|item| item.price.filter(|_| item.is_priced).map(|p| p * item.quantity))
            .sum()
    }
}

/// A completed request as listed for the purchasing department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPurchaseRequestView {
    /// Request identifier
    pub id: i64,
    /// `PR-<year>-<sequence>`
    pub request_number: String,
    /// Supplier code
    pub supplier_code: String,
    /// Supplier company name
    pub supplier_title: String,
    /// When the request was completed
    pub completed_at: DateTime<Utc>,
    /// Priced items
    pub items: Vec<PurchaseRequestItemView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(id: i64, quantity: Decimal, price: Option<Decimal>) -> PurchaseRequestItemView {
        PurchaseRequestItemView {
            id,
            purchase_request_id: 1,
            product_name: format!("Product {id}"),
            quantity,
            unit: "pcs".to_string(),
            price,
            delivery_date: price.map(|_| Utc::now().date_naive()),
            is_priced: price.is_some(),
        }
    }

    #[test]
    fn test_view_total_ignores_unpriced_items() {
        let view = PurchaseRequestView {
            id: 1,
            request_number: "PR-2025-000001".to_string(),
            supplier_id: 7,
            supplier_title: "Acme".to_string(),
            status: PurchaseRequestStatus::InProgress,
            request_date: Utc::now(),
            completed_at: None,
            notes: None,
            items: vec![item(1, dec!(2), Some(dec!(10))), item(2, dec!(5), None)],
        };

        assert_eq!(view.total_price(), dec!(20));
    }
}
