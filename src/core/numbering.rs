//! Request number generation.
//!
//! Numbers look like `PR-2025-000042`: a fixed prefix, the UTC year the request
//! was raised in, and a zero-padded sequence. The sequence continues from the
//! latest request carrying the current year and restarts at 1 when the year
//! changes. Soft-deleted requests still occupy their number, so the lookup
//! bypasses the soft-delete filter.

use crate::{
    entities::{PurchaseRequest, purchase_request},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, prelude::*};
use tracing::debug;

/// Leading segment of every request number.
pub const REQUEST_NUMBER_PREFIX: &str = "PR";

/// Renders `PR-{year}-{sequence:06}`.
#[must_use]
pub fn format_request_number(year: i32, sequence: u32) -> String {
    format!("{REQUEST_NUMBER_PREFIX}-{year}-{sequence:06}")
}

/// Splits a request number into `(year, sequence)`.
///
/// Only the last two `-` separated segments are inspected; anything that does
/// not parse yields `None`.
#[must_use]
pub fn parse_request_number(number: &str) -> Option<(i32, u32)> {
    let mut parts = number.rsplitn(3, '-');
    let sequence = parts.next()?.parse().ok()?;
    let year = parts.next()?.parse().ok()?;
    Some((year, sequence))
}

/// Computes the number that follows `last` in `year`.
///
/// Starts at 1 when there is no previous number, when it is blank, or when it
/// belongs to a different year.
///
/// # Errors
/// Returns [`Error::Conflict`] if `last` cannot be parsed or its sequence is
/// already at the maximum.
pub fn next_request_number(last: Option<&str>, year: i32) -> Result<String> {
    let Some(last) = last.map(str::trim).filter(|last| !last.is_empty()) else {
        return Ok(format_request_number(year, 1));
    };
    let (last_year, sequence) = parse_request_number(last).ok_or_else(|| {
        Error::conflict(format!(
            "cannot continue numbering after unrecognised request number '{last}'"
        ))
    })?;
    if last_year != year {
        return Ok(format_request_number(year, 1));
    }
    let next = sequence.checked_add(1).ok_or_else(|| {
        Error::conflict(format!("request number sequence for {year} is exhausted"))
    })?;
    Ok(format_request_number(year, next))
}

/// Generates the next request number for `year` from the stored requests.
///
/// Callers must insert the result inside the same transaction and treat a
/// unique-key conflict as a signal to regenerate.
pub async fn generate_request_number<C>(db: &C, year: i32) -> Result<String>
where
    C: ConnectionTrait,
{
    let year_prefix = format!("{REQUEST_NUMBER_PREFIX}-{year}-");
    let last = PurchaseRequest::find()
        .filter(purchase_request::Column::RequestNumber.starts_with(year_prefix.as_str()))
        .order_by_desc(purchase_request::Column::Id)
        .one(db)
        .await?;

    let next = next_request_number(last.as_ref().map(|r| r.request_number.as_str()), year)?;
    debug!(
        "Generated request number {} (previous: {:?})",
        next,
        last.map(|r| r.request_number)
    );
    Ok(next)
}
