//! Account entity - Represents a login identity (administrator, user, or supplier).
//!
//! Usernames and emails are unique across all accounts, including soft-deleted ones.
//! Supplier accounts own a [`super::supplier_profile`] row and the purchase requests
//! addressed to them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role an account plays in the portal. Stored as an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum AccountRole {
    /// Regular back-office user
    #[sea_orm(num_value = 0)]
    User,
    /// Administrator managing supplier accounts
    #[sea_orm(num_value = 1)]
    Admin,
    /// External supplier pricing purchase requests
    #[sea_orm(num_value = 2)]
    Supplier,
}

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name
    #[sea_orm(unique)]
    pub username: String,
    /// Contact email address
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub full_name: Option<String>,
    /// Account role
    pub role: AccountRole,
    /// Whether the account may sign in
    pub is_active: bool,
    /// Soft delete flag - if true, account is hidden but data is preserved
    pub is_deleted: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A supplier account has one profile
    #[sea_orm(has_one = "super::supplier_profile::Entity")]
    SupplierProfile,
    /// A supplier account receives many purchase requests
    #[sea_orm(has_many = "super::purchase_request::Entity")]
    PurchaseRequests,
}

impl Related<super::supplier_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierProfile.def()
    }
}

impl Related<super::purchase_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
