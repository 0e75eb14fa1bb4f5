// crates/certsuite-usage-core/tests/support/mod.rs
// ============================================================================
// Module: Usage Test Support
// Description: Scripted upstream clients shared by core integration tests.
// Purpose: Feed fixed payloads to the aggregators without network access.
// Dependencies: certsuite-usage-core
// ============================================================================

//! ## Overview
//! Scripted clients return fixed payloads or fixed errors and record the
//! arguments they were called with. [`FailingAfter`] is a store that rejects
//! every write past a fixed number.

#![allow(dead_code, reason = "Helpers are shared across test crates and not all are used by each.")]

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use certsuite_usage_core::AggregatedLogEntry;
use certsuite_usage_core::AggregatedLogRow;
use certsuite_usage_core::AggregatedLogs;
use certsuite_usage_core::CiClient;
use certsuite_usage_core::ClientError;
use certsuite_usage_core::Component;
use certsuite_usage_core::ComponentRunRow;
use certsuite_usage_core::FetchWindow;
use certsuite_usage_core::InMemoryUsageStore;
use certsuite_usage_core::Job;
use certsuite_usage_core::JobResult;
use certsuite_usage_core::JobsPage;
use certsuite_usage_core::RegistryClient;
use certsuite_usage_core::StoreError;
use certsuite_usage_core::StoreOpener;
use certsuite_usage_core::UsageStore;
use time::Date;

/// Registry client returning a fixed response.
pub struct ScriptedRegistry {
    /// Entries returned on success.
    pub entries: Vec<AggregatedLogEntry>,
    /// Status returned instead of entries when set.
    pub fail_status: Option<u16>,
    /// Recorded `(namespace, repository, window)` calls.
    pub calls: RefCell<Vec<(String, String, FetchWindow)>>,
}

impl ScriptedRegistry {
    /// Returns a client answering with `entries`.
    pub fn returning(entries: Vec<AggregatedLogEntry>) -> Self {
        Self {
            entries,
            fail_status: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Returns a client answering with an HTTP status error.
    pub fn failing(status: u16) -> Self {
        Self {
            entries: Vec::new(),
            fail_status: Some(status),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl RegistryClient for ScriptedRegistry {
    fn aggregated_logs(
        &self,
        namespace: &str,
        repository: &str,
        window: &FetchWindow,
    ) -> Result<AggregatedLogs, ClientError> {
        self.calls.borrow_mut().push((namespace.to_string(), repository.to_string(), *window));
        if let Some(status) = self.fail_status {
            return Err(ClientError::Status {
                status,
                body: "scripted failure".to_string(),
            });
        }
        Ok(AggregatedLogs {
            aggregated: self.entries.clone(),
        })
    }
}

/// CI client returning fixed pages.
pub struct ScriptedCi {
    /// Pages returned on success.
    pub pages: Vec<JobsPage>,
    /// Whether to fail instead.
    pub fail: bool,
    /// Recorded `days_back` arguments.
    pub calls: RefCell<Vec<u32>>,
}

impl ScriptedCi {
    /// Returns a client answering with `pages`.
    pub fn returning(pages: Vec<JobsPage>) -> Self {
        Self {
            pages,
            fail: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Returns a client answering with a request error.
    pub fn failing() -> Self {
        Self {
            pages: Vec::new(),
            fail: true,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl CiClient for ScriptedCi {
    fn jobs(&self, days_back: u32) -> Result<Vec<JobsPage>, ClientError> {
        self.calls.borrow_mut().push(days_back);
        if self.fail {
            return Err(ClientError::Request("connection refused".to_string()));
        }
        Ok(self.pages.clone())
    }
}

/// Store accepting the first `limit` writes and failing every later one.
#[derive(Clone)]
pub struct FailingAfter {
    /// Backing store for accepted writes.
    pub inner: InMemoryUsageStore,
    /// Writes accepted before failures start.
    pub limit: usize,
    /// Write attempts seen, accepted or not.
    pub attempts: Arc<AtomicUsize>,
}

impl FailingAfter {
    /// Returns a store that fails from write `limit + 1` onward.
    pub fn new(limit: usize) -> Self {
        Self {
            inner: InMemoryUsageStore::new(),
            limit,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the number of write attempts.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Counts an attempt and fails once the limit is passed.
    fn admit(&self) -> Result<(), StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > self.limit {
            return Err(StoreError::Write(format!("disk full at write {attempt}")));
        }
        Ok(())
    }
}

impl UsageStore for FailingAfter {
    fn ensure_tables(&self) -> Result<(), StoreError> {
        self.inner.ensure_tables()
    }

    fn upsert_aggregated_log(&self, row: &AggregatedLogRow) -> Result<(), StoreError> {
        self.admit()?;
        self.inner.upsert_aggregated_log(row)
    }

    fn upsert_component_run(&self, row: &ComponentRunRow) -> Result<(), StoreError> {
        self.admit()?;
        self.inner.upsert_component_run(row)
    }

    fn load_aggregated_log(
        &self,
        date: Date,
        kind: &str,
    ) -> Result<Option<AggregatedLogRow>, StoreError> {
        self.inner.load_aggregated_log(date, kind)
    }

    fn load_component_run(&self, job_id: &str) -> Result<Option<ComponentRunRow>, StoreError> {
        self.inner.load_component_run(job_id)
    }
}

impl StoreOpener for FailingAfter {
    fn open(&self) -> Result<Box<dyn UsageStore>, StoreError> {
        self.inner.ensure_tables()?;
        Ok(Box::new(self.clone()))
    }
}

/// Builds a registry log entry.
pub fn entry(datetime: &str, count: i64, kind: &str) -> AggregatedLogEntry {
    AggregatedLogEntry {
        datetime: datetime.to_string(),
        count,
        kind: kind.to_string(),
    }
}

/// Builds a CI job.
pub fn job(id: &str, created_at: &str, components: &[&str], results: Vec<JobResult>) -> Job {
    Job {
        id: id.to_string(),
        created_at: created_at.to_string(),
        components: components
            .iter()
            .map(|name| Component {
                name: (*name).to_string(),
            })
            .collect(),
        results,
    }
}

/// Builds a CI job result.
pub fn result(name: &str, success: i64, failures: i64, errors: i64, skips: i64) -> JobResult {
    JobResult {
        name: name.to_string(),
        success,
        failures,
        errors,
        skips,
    }
}
