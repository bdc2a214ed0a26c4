//! Purchase request entity - A supplier order document moving through
//! Pending, `InProgress` and Completed.
//!
//! Rows are written through [`crate::core::lifecycle::PurchaseRequestAggregate`];
//! `completed_at` is set exactly when `status` is `Completed`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workflow state of a purchase request. Stored as an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum PurchaseRequestStatus {
    /// Created, nothing priced yet
    #[sea_orm(num_value = 0)]
    Pending,
    /// At least one item has been priced
    #[sea_orm(num_value = 1)]
    InProgress,
    /// Every item priced and the request closed
    #[sea_orm(num_value = 2)]
    Completed,
    /// Reserved; no operation transitions into it
    #[sea_orm(num_value = 3)]
    Cancelled,
}

/// Purchase request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing number, `PR-<year>-<6-digit sequence>`
    #[sea_orm(unique)]
    pub request_number: String,
    /// Supplier account the request is addressed to
    pub supplier_id: i64,
    /// Current workflow state
    pub status: PurchaseRequestStatus,
    /// When the request was raised
    pub request_date: DateTimeUtc,
    /// When the request was completed
    pub completed_at: Option<DateTimeUtc>,
    /// Free-text notes for the supplier
    pub notes: Option<String>,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `PurchaseRequest` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each request is addressed to one supplier account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::SupplierId",
        to = "super::account::Column::Id",
        on_delete = "Restrict"
    )]
    Supplier,
    /// One request owns many line items
    #[sea_orm(has_many = "super::purchase_request_item::Entity")]
    Items,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::purchase_request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
