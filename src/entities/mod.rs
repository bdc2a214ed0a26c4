//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod purchase_request;
pub mod purchase_request_item;
pub mod soft_delete;
pub mod supplier_profile;

// Re-export specific types to avoid conflicts
pub use account::{AccountRole, Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use purchase_request::{
    Column as PurchaseRequestColumn, Entity as PurchaseRequest, Model as PurchaseRequestModel,
    PurchaseRequestStatus,
};
pub use purchase_request_item::{
    Column as PurchaseRequestItemColumn, Entity as PurchaseRequestItem,
    Model as PurchaseRequestItemModel,
};
pub use soft_delete::SoftDelete;
pub use supplier_profile::{
    Column as SupplierProfileColumn, Entity as SupplierProfile, Model as SupplierProfileModel,
};
