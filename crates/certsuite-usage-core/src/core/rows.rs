// crates/certsuite-usage-core/src/core/rows.rs
// ============================================================================
// Module: Usage Rows
// Description: Persisted row model for registry pulls and CI component runs.
// Purpose: Validate aggregated values before they reach a store backend.
// Dependencies: thiserror, time
// ============================================================================

//! ## Overview
//! Two row kinds are persisted: [`AggregatedLogRow`] keyed by `(date, kind)`
//! and [`ComponentRunRow`] keyed by `job_id`. Rows are validated on
//! construction and again by every store before a write, so a backend never
//! observes an empty identity column or a negative counter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ops::Add;
use std::ops::AddAssign;

use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Calendar date layout used for persisted log dates (`YYYY-MM-DD`).
pub const STORE_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");
/// Commit placeholder used when a component name carries no commit token.
pub const UNKNOWN_COMMIT: &str = "unknown";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Row validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text column was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Column name.
        field: &'static str,
    },
    /// A counter column was negative.
    #[error("{field} must not be negative (got {value})")]
    Negative {
        /// Column name.
        field: &'static str,
        /// Rejected value.
        value: i64,
    },
    /// A date column could not be parsed.
    #[error("invalid date {value:?}: expected YYYY-MM-DD")]
    Date {
        /// Rejected input.
        value: String,
    },
}

// ============================================================================
// SECTION: Aggregated Log Row
// ============================================================================

/// One day's pull count for one event kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedLogRow {
    /// Calendar date of the observation.
    pub date: Date,
    /// Event kind label (for example `pull_repo`).
    pub kind: String,
    /// Observed count.
    pub count: i64,
}

impl AggregatedLogRow {
    /// Builds a validated row.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `kind` is empty or `count` is negative.
    pub fn new(date: Date, kind: impl Into<String>, count: i64) -> Result<Self, ValidationError> {
        let row = Self {
            date,
            kind: kind.into(),
            count,
        };
        row.validate()?;
        Ok(row)
    }

    /// Builds a validated row from a `YYYY-MM-DD` date string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the date is unparsable or the row is
    /// otherwise invalid.
    pub fn parse(date: &str, kind: impl Into<String>, count: i64) -> Result<Self, ValidationError> {
        let parsed = parse_store_date(date)?;
        Self::new(parsed, kind, count)
    }

    /// Checks the row invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "kind",
            });
        }
        if self.count < 0 {
            return Err(ValidationError::Negative {
                field: "count",
                value: self.count,
            });
        }
        Ok(())
    }

    /// Returns the date rendered as `YYYY-MM-DD`.
    #[must_use]
    pub fn date_text(&self) -> String {
        format_store_date(self.date)
    }
}

// ============================================================================
// SECTION: Component Run Row
// ============================================================================

/// Summed test-result counters for one CI job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultTotals {
    /// Successful test cases.
    pub success: i64,
    /// Failed test cases.
    pub failures: i64,
    /// Errored test cases.
    pub errors: i64,
    /// Skipped test cases.
    pub skips: i64,
}

impl ResultTotals {
    /// Returns true when every counter is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.success == 0 && self.failures == 0 && self.errors == 0 && self.skips == 0
    }

    /// Checks that no counter is negative.
    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("total_success", self.success),
            ("total_failures", self.failures),
            ("total_errors", self.errors),
            ("total_skips", self.skips),
        ] {
            if value < 0 {
                return Err(ValidationError::Negative {
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Add for ResultTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            success: self.success.saturating_add(rhs.success),
            failures: self.failures.saturating_add(rhs.failures),
            errors: self.errors.saturating_add(rhs.errors),
            skips: self.skips.saturating_add(rhs.skips),
        }
    }
}

impl AddAssign for ResultTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Cumulative test-result counters for one CI job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRunRow {
    /// CI job identifier.
    pub job_id: String,
    /// Commit reference extracted from the component name.
    pub commit_hash: String,
    /// Job creation time.
    pub created_at: OffsetDateTime,
    /// Summed counters.
    pub totals: ResultTotals,
}

impl ComponentRunRow {
    /// Builds a validated row.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when an identity column is empty or a
    /// counter is negative.
    pub fn new(
        job_id: impl Into<String>,
        commit_hash: impl Into<String>,
        created_at: OffsetDateTime,
        totals: ResultTotals,
    ) -> Result<Self, ValidationError> {
        let row = Self {
            job_id: job_id.into(),
            commit_hash: commit_hash.into(),
            created_at,
            totals,
        };
        row.validate()?;
        Ok(row)
    }

    /// Checks the row invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.job_id.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "job_id",
            });
        }
        if self.commit_hash.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "commit_hash",
            });
        }
        self.totals.validate()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a persisted `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`ValidationError::Date`] when the text is not a valid date.
pub fn parse_store_date(value: &str) -> Result<Date, ValidationError> {
    Date::parse(value.trim(), STORE_DATE_FORMAT).map_err(|_| ValidationError::Date {
        value: value.to_string(),
    })
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_store_date(date: Date) -> String {
    date.format(STORE_DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
