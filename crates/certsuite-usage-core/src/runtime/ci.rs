// crates/certsuite-usage-core/src/runtime/ci.rs
// ============================================================================
// Module: CI Job Aggregator
// Description: Test-result ingestion from the CI job-reporting API.
// Purpose: Upsert one row per job for jobs that exercised the product.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! A run fetches jobs from the trailing day, keeps the components whose name
//! references the product under test, and for each one sums the counters of
//! the job's certsuite JUnit report. Sums start from zero for every
//! component, so several relevant components on one job never inflate each
//! other. The resulting row replaces any stored row for the same job.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;
use tracing::error;
use tracing::info;

use crate::core::Component;
use crate::core::ComponentRunRow;
use crate::core::Job;
use crate::core::JobResult;
use crate::core::ResultTotals;
use crate::core::UNKNOWN_COMMIT;
use crate::core::parse_ci_timestamp;
use crate::interfaces::CiClient;
use crate::interfaces::StoreOpener;
use crate::runtime::error::IngestError;
use crate::runtime::error::RunSummary;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Trailing window, in days, of CI jobs fetched per run.
pub const DAYS_BACK: u32 = 1;
/// Component name fragments identifying the product under test.
pub const RELEVANT_COMPONENT_MARKERS: [&str; 2] = ["cnf-certification-test", "certsuite"];
/// Result file whose counters are summed.
pub const CERTSUITE_REPORT_NAME: &str = "certsuite-tests_junit.xml";

// ============================================================================
// SECTION: Transforms
// ============================================================================

/// Returns the second whitespace-separated token of a component name.
///
/// `"certsuite abc123"` yields `"abc123"`; a single-token name yields
/// [`UNKNOWN_COMMIT`].
#[must_use]
pub fn extract_commit_hash(component_name: &str) -> String {
    component_name.split_whitespace().nth(1).unwrap_or(UNKNOWN_COMMIT).to_string()
}

/// Returns true when the component name references the product under test.
#[must_use]
pub fn is_relevant_component(component_name: &str) -> bool {
    RELEVANT_COMPONENT_MARKERS.iter().any(|marker| component_name.contains(marker))
}

/// Sums the counters of results named `report_name`.
#[must_use]
pub fn sum_report_results(results: &[JobResult], report_name: &str) -> ResultTotals {
    results.iter().filter(|result| result.name == report_name).fold(
        ResultTotals::default(),
        |totals, result| {
            totals
                + ResultTotals {
                    success: result.success,
                    failures: result.failures,
                    errors: result.errors,
                    skips: result.skips,
                }
        },
    )
}

/// Builds the rows a job contributes, one per relevant component.
///
/// # Errors
///
/// Returns [`IngestError::DatetimeParse`] when a job with relevant components
/// has an unparsable creation time, and a store validation error when the
/// job id or extracted commit is empty.
pub fn component_runs(job: &Job) -> Result<Vec<ComponentRunRow>, IngestError> {
    let relevant: Vec<&Component> =
        job.components.iter().filter(|component| is_relevant_component(&component.name)).collect();
    if relevant.is_empty() {
        return Ok(Vec::new());
    }
    let created_at = parse_ci_timestamp(&job.created_at)?;
    relevant
        .into_iter()
        .map(|component| {
            let totals = sum_report_results(&job.results, CERTSUITE_REPORT_NAME);
            ComponentRunRow::new(
                job.id.clone(),
                extract_commit_hash(&component.name),
                created_at,
                totals,
            )
            .map_err(IngestError::from)
        })
        .collect()
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Ingests CI job results into a usage store.
pub struct CiJobAggregator<'a, C: ?Sized, S: ?Sized> {
    /// CI API client.
    client: &'a C,
    /// Store opened once per run.
    stores: &'a S,
}

impl<'a, C, S> CiJobAggregator<'a, C, S>
where
    C: CiClient + ?Sized,
    S: StoreOpener + ?Sized,
{
    /// Creates an aggregator.
    #[must_use]
    pub const fn new(client: &'a C, stores: &'a S) -> Self {
        Self {
            client,
            stores,
        }
    }

    /// Fetches the trailing day of jobs and upserts their component runs.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on the first fetch, parse, or store failure.
    pub fn run(&self) -> Result<RunSummary, IngestError> {
        let store = self.stores.open()?;
        info!(days_back = DAYS_BACK, "fetching ci jobs");
        let pages = self.client.jobs(DAYS_BACK).map_err(|err| {
            error!(error = %err, "ci fetch failed");
            IngestError::Fetch(err)
        })?;
        info!(pages = pages.len(), "fetched ci job pages");

        let mut summary = RunSummary::default();
        for job in pages.iter().flat_map(|page| page.jobs.iter()) {
            summary.fetched += 1;
            let rows = component_runs(job).map_err(|err| {
                error!(job_id = %job.id, error = %err, "ci job rejected");
                err
            })?;
            for row in rows {
                debug!(
                    job_id = %row.job_id,
                    commit = %row.commit_hash,
                    success = row.totals.success,
                    failures = row.totals.failures,
                    errors = row.totals.errors,
                    skips = row.totals.skips,
                    "upserting component run"
                );
                store.upsert_component_run(&row).map_err(|err| {
                    error!(job_id = %row.job_id, commit = %row.commit_hash, error = %err, "component run write failed");
                    err
                })?;
                summary.upserts += 1;
            }
        }
        info!(jobs = summary.fetched, upserts = summary.upserts, "stored ci component runs");
        Ok(summary)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]

    use super::*;

    fn result(name: &str, success: i64, failures: i64, errors: i64, skips: i64) -> JobResult {
        JobResult {
            name: name.to_string(),
            success,
            failures,
            errors,
            skips,
        }
    }

    fn job(components: &[&str], results: Vec<JobResult>) -> Job {
        Job {
            id: "job-1".to_string(),
            created_at: "2024-11-26T12:00:00.123456".to_string(),
            components: components
                .iter()
                .map(|name| Component {
                    name: (*name).to_string(),
                })
                .collect(),
            results,
        }
    }

    #[test]
    fn commit_hash_takes_second_token() {
        assert_eq!(extract_commit_hash("certsuite abc123"), "abc123");
        assert_eq!(extract_commit_hash("certsuite   abc123 extra"), "abc123");
    }

    #[test]
    fn commit_hash_defaults_to_unknown() {
        assert_eq!(extract_commit_hash("certsuite"), UNKNOWN_COMMIT);
        assert_eq!(extract_commit_hash("certsuite "), UNKNOWN_COMMIT);
        assert_eq!(extract_commit_hash(""), UNKNOWN_COMMIT);
    }

    #[test]
    fn relevance_matches_either_marker() {
        assert!(is_relevant_component("cnf-certification-test v1.0"));
        assert!(is_relevant_component("certsuite abc123"));
        assert!(!is_relevant_component("unrelated-tool 2.0"));
    }

    #[test]
    fn report_sum_ignores_other_result_files() {
        let results = vec![
            result(CERTSUITE_REPORT_NAME, 10, 2, 1, 5),
            result("other_junit.xml", 100, 100, 100, 100),
            result(CERTSUITE_REPORT_NAME, 1, 1, 1, 1),
        ];
        let totals = sum_report_results(&results, CERTSUITE_REPORT_NAME);
        assert_eq!(
            totals,
            ResultTotals {
                success: 11,
                failures: 3,
                errors: 2,
                skips: 6,
            }
        );
    }

    #[test]
    fn unrelated_components_produce_no_rows() {
        let rows = component_runs(&job(&["unrelated-tool 2.0"], Vec::new())).expect("rows");
        assert!(rows.is_empty());
    }

    #[test]
    fn unrelated_job_with_bad_timestamp_is_skipped() {
        let mut unrelated = job(&["unrelated-tool 2.0"], Vec::new());
        unrelated.created_at = "not a timestamp".to_string();
        assert!(component_runs(&unrelated).expect("rows").is_empty());
    }

    #[test]
    fn sums_reset_for_each_relevant_component() {
        let rows = component_runs(&job(
            &["certsuite abc123", "cnf-certification-test def456"],
            vec![result(CERTSUITE_REPORT_NAME, 4, 1, 0, 2)],
        ))
        .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].commit_hash, "abc123");
        assert_eq!(rows[1].commit_hash, "def456");
        for row in &rows {
            assert_eq!(
                row.totals,
                ResultTotals {
                    success: 4,
                    failures: 1,
                    errors: 0,
                    skips: 2,
                }
            );
        }
    }

    #[test]
    fn relevant_job_with_bad_timestamp_fails() {
        let mut relevant = job(&["certsuite abc123"], Vec::new());
        relevant.created_at = "not a timestamp".to_string();
        assert!(matches!(component_runs(&relevant), Err(IngestError::DatetimeParse(_))));
    }
}
