//! Unified error type for the supplier portal.
//!
//! Business failures are split into the kinds callers need to tell apart:
//! missing records, rejected input, operations that clash with the current
//! state of a request, and request-number collisions that are safe to retry.

use thiserror::Error;

/// Application error type returned by every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced request, item, or supplier does not exist (or is soft-deleted).
    #[error("{entity} with ID {id} not found")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// Input was malformed or out of range.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable description including the rejected value
        message: String,
    },

    /// The operation is not allowed in the current state of the record.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable description of the conflict
        message: String,
    },

    /// A unique key was already taken by a concurrent writer.
    #[error("Unique key conflict on {key}")]
    UniqueConflict {
        /// The key value that collided
        key: String,
    },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Error surfaced by the database layer.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] keyed by any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`Error::Validation`] on `field`.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Whether repeating the operation (after regenerating its key) may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::UniqueConflict { .. })
    }

    /// Converts a store error into [`Error::UniqueConflict`] when it reports a
    /// unique-constraint violation, otherwise into [`Error::Database`].
    pub fn from_insert(err: sea_orm::DbErr, key: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => Self::UniqueConflict {
                key: key.to_string(),
            },
            _ => Self::Database(err),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
