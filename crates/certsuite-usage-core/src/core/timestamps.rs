// crates/certsuite-usage-core/src/core/timestamps.rs
// ============================================================================
// Module: Timestamp Parsing
// Description: Parsers for the datetime formats emitted by upstream APIs.
// Purpose: Normalize registry datetimes to dates and CI timestamps to UTC.
// Dependencies: thiserror, time
// ============================================================================

//! ## Overview
//! The registry reports aggregated log datetimes in RFC 2822 form
//! (`Mon, 02 Jan 2006 15:04:05 -0000`), and the CI API reports job creation
//! times as ISO-8601 without an offset. Both are parsed here so the
//! aggregators only deal with typed [`Date`] and [`OffsetDateTime`] values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc2822;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Offset-less ISO-8601 timestamp with optional fractional seconds.
const NAIVE_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);
/// Same as [`NAIVE_TIMESTAMP_FORMAT`] with a space separator.
const NAIVE_SPACED_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);
/// Zone suffixes that denote UTC in registry output.
const UTC_ZONE_SUFFIXES: [&str; 4] = [" -0000", " GMT", " UTC", " UT"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Registry datetime did not match RFC 2822.
    #[error("invalid registry datetime {value:?}: {reason}")]
    Registry {
        /// Rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// CI timestamp did not match RFC 3339 or naive ISO-8601.
    #[error("invalid ci timestamp {value:?}: {reason}")]
    Ci {
        /// Rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}

// ============================================================================
// SECTION: Parsers
// ============================================================================

/// Parses a registry datetime and returns its calendar date.
///
/// The date is taken in the datetime's own offset, so
/// `Mon, 02 Jan 2006 23:30:00 -0700` maps to 2006-01-02.
///
/// # Errors
///
/// Returns [`TimestampError::Registry`] when the input is not RFC 2822.
pub fn parse_registry_datetime(value: &str) -> Result<Date, TimestampError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Registry {
            value: value.to_string(),
            reason: "empty datetime".to_string(),
        });
    }
    let normalized = normalize_utc_zone(trimmed);
    OffsetDateTime::parse(&normalized, &Rfc2822).map(OffsetDateTime::date).map_err(|err| {
        TimestampError::Registry {
            value: value.to_string(),
            reason: err.to_string(),
        }
    })
}

/// Parses a CI job timestamp.
///
/// RFC 3339 input keeps its offset; offset-less input is read as UTC.
///
/// # Errors
///
/// Returns [`TimestampError::Ci`] when no supported layout matches.
pub fn parse_ci_timestamp(value: &str) -> Result<OffsetDateTime, TimestampError> {
    let trimmed = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }
    PrimitiveDateTime::parse(trimmed, NAIVE_TIMESTAMP_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, NAIVE_SPACED_TIMESTAMP_FORMAT))
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|err| TimestampError::Ci {
            value: value.to_string(),
            reason: err.to_string(),
        })
}

/// Rewrites UTC zone spellings to `+0000` so the RFC 2822 parser accepts them.
fn normalize_utc_zone(value: &str) -> String {
    for suffix in UTC_ZONE_SUFFIXES {
        if let Some(prefix) = value.strip_suffix(suffix) {
            return format!("{prefix} +0000");
        }
    }
    value.to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
