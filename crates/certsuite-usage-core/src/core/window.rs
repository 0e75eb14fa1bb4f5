// crates/certsuite-usage-core/src/core/window.rs
// ============================================================================
// Module: Fetch Window
// Description: Date-bounded window for registry log queries.
// Purpose: Derive the [yesterday, today] range from a single instant.
// Dependencies: time
// ============================================================================

//! ## Overview
//! The registry usage run asks for logs between yesterday and today. The
//! window is derived from one instant so tests can pin it; query parameters
//! are rendered in the registry's `MM/DD/YYYY` form. Dates are taken in the
//! instant's own offset, so a run uses the host's local calendar day when the
//! local offset is known and UTC otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Date;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Date layout accepted by the registry query parameters.
pub const REGISTRY_QUERY_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month]/[day]/[year]");

// ============================================================================
// SECTION: Window
// ============================================================================

/// Inclusive date window for a registry fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// First date (24 hours before the reference instant).
    pub start: Date,
    /// Last date (the reference instant's date).
    pub end: Date,
}

impl FetchWindow {
    /// Builds the window ending at `now`.
    #[must_use]
    pub fn ending_at(now: OffsetDateTime) -> Self {
        let yesterday = now.checked_sub(Duration::hours(24)).unwrap_or(now);
        Self {
            start: yesterday.date(),
            end: now.date(),
        }
    }

    /// Builds the window ending at the current local instant, falling back to
    /// UTC when the local offset cannot be determined.
    #[must_use]
    pub fn ending_now() -> Self {
        Self::ending_at(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()))
    }

    /// Returns the start date as `MM/DD/YYYY`.
    #[must_use]
    pub fn start_param(&self) -> String {
        format_query_date(self.start)
    }

    /// Returns the end date as `MM/DD/YYYY`.
    #[must_use]
    pub fn end_param(&self) -> String {
        format_query_date(self.end)
    }
}

/// Formats a date for registry query parameters.
fn format_query_date(date: Date) -> String {
    date.format(REGISTRY_QUERY_DATE_FORMAT).unwrap_or_else(|_| {
        format!("{:02}/{:02}/{:04}", u8::from(date.month()), date.day(), date.year())
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
