//! Store-level soft-delete filtering.
//!
//! Every table carries an `is_deleted` column. Default reads go through
//! [`SoftDelete::find_active`] / [`SoftDelete::find_active_by_id`] so a deleted row
//! can only be seen by code that explicitly asks for `find()`.

use sea_orm::{ColumnTrait, EntityTrait, PrimaryKeyTrait, QueryFilter, Select};

/// Entities whose rows are hidden by an `is_deleted = true` flag.
pub trait SoftDelete: EntityTrait {
    /// The boolean column marking a row as deleted.
    fn is_deleted_column() -> Self::Column;

    /// `SELECT ... WHERE is_deleted = false`
    #[must_use]
    fn find_active() -> Select<Self> {
        Self::find().filter(ColumnTrait::eq(&Self::is_deleted_column(), false))
    }

    /// Primary-key lookup that ignores soft-deleted rows.
    #[must_use]
    fn find_active_by_id<T>(id: T) -> Select<Self>
    where
        T: Into<<Self::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        Self::find_by_id(id).filter(ColumnTrait::eq(&Self::is_deleted_column(), false))
    }
}

impl SoftDelete for super::account::Entity {
    fn is_deleted_column() -> Self::Column {
        super::account::Column::IsDeleted
    }
}

impl SoftDelete for super::supplier_profile::Entity {
    fn is_deleted_column() -> Self::Column {
        super::supplier_profile::Column::IsDeleted
    }
}

impl SoftDelete for super::purchase_request::Entity {
    fn is_deleted_column() -> Self::Column {
        super::purchase_request::Column::IsDeleted
    }
}

impl SoftDelete for super::purchase_request_item::Entity {
    fn is_deleted_column() -> Self::Column {
        super::purchase_request_item::Column::IsDeleted
    }
}
