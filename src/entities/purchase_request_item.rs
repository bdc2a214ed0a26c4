//! Purchase request item entity - One product line on a purchase request.
//!
//! `product_name`, `quantity` and `unit` are fixed at creation. The pricing
//! columns are only ever written through [`crate::core::pricing::LineItem`], which keeps
//! `is_priced` equal to `price.is_some() && delivery_date.is_some()`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase request item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_request_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent request
    pub purchase_request_id: i64,
    /// Name of the requested product
    pub product_name: String,
    /// Requested quantity
    pub quantity: Decimal,
    /// Unit of measure (e.g. "kg", "pcs")
    pub unit: String,
    /// Unit price quoted by the supplier
    pub price: Option<Decimal>,
    /// Promised delivery date
    pub delivery_date: Option<Date>,
    /// Whether both price and delivery date are set
    pub is_priced: bool,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the item was created
    pub created_at: DateTimeUtc,
    /// When the item was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `PurchaseRequestItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one request and is removed with it
    #[sea_orm(
        belongs_to = "super::purchase_request::Entity",
        from = "Column::PurchaseRequestId",
        to = "super::purchase_request::Column::Id",
        on_delete = "Cascade"
    )]
    PurchaseRequest,
}

impl Related<super::purchase_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
