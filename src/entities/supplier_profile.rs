//! Supplier profile entity - Business details attached to a supplier account.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_profiles")]
pub struct Model {
    /// Unique identifier for the profile
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning account (one profile per account)
    #[sea_orm(unique)]
    pub account_id: i64,
    /// Short supplier code, unique across suppliers
    #[sea_orm(unique)]
    pub code: String,
    /// Company name shown on purchase requests
    pub title: String,
    /// Contact phone number
    pub phone: String,
    /// Postal address
    pub address: String,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the profile was created
    pub created_at: DateTimeUtc,
    /// When the profile was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `SupplierProfile` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each profile belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
