/// Item-level queries and pricing operations
pub mod item;

/// Purchase request aggregate and its state machine
pub mod lifecycle;

/// Outbound notifications (supplier onboarding emails)
pub mod notify;

/// `PR-<year>-<sequence>` request number generation
pub mod numbering;

/// Price and delivery-date validation for line items
pub mod pricing;

/// Purchase request creation, queries and workflow operations
pub mod purchase_request;

/// Supplier accounts and profiles
pub mod supplier;

/// Serializable read models
pub mod views;
