// crates/certsuite-usage-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Usage Store
// Description: Simple in-memory usage store for tests and dry runs.
// Purpose: Provide a store implementation without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryUsageStore`] applies the same conflict policy as the durable
//! backends. Clones share state, so it also serves as its own
//! [`StoreOpener`]. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use time::Date;

use crate::core::AggregatedLogRow;
use crate::core::ComponentRunRow;
use crate::interfaces::StoreError;
use crate::interfaces::StoreOpener;
use crate::interfaces::UsageStore;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Shared table contents.
#[derive(Debug, Default)]
struct Tables {
    /// Aggregated logs keyed by `(date, kind)`.
    logs: BTreeMap<(Date, String), AggregatedLogRow>,
    /// Component runs keyed by job id.
    runs: BTreeMap<String, ComponentRunRow>,
}

/// In-memory usage store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUsageStore {
    /// Table contents protected by a mutex.
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryUsageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored log row ordered by `(date, kind)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] when the store mutex is poisoned.
    pub fn aggregated_logs(&self) -> Result<Vec<AggregatedLogRow>, StoreError> {
        let tables = self.lock().map_err(StoreError::Read)?;
        Ok(tables.logs.values().cloned().collect())
    }

    /// Returns every stored component run ordered by job id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] when the store mutex is poisoned.
    pub fn component_runs(&self) -> Result<Vec<ComponentRunRow>, StoreError> {
        let tables = self.lock().map_err(StoreError::Read)?;
        Ok(tables.runs.values().cloned().collect())
    }

    /// Locks the tables.
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables.lock().map_err(|_| "mutex poisoned".to_string())
    }
}

impl UsageStore for InMemoryUsageStore {
    fn ensure_tables(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn upsert_aggregated_log(&self, row: &AggregatedLogRow) -> Result<(), StoreError> {
        row.validate()?;
        let mut tables = self.lock().map_err(StoreError::Write)?;
        tables
            .logs
            .entry((row.date, row.kind.clone()))
            .and_modify(|stored| stored.count = stored.count.saturating_add(row.count))
            .or_insert_with(|| row.clone());
        Ok(())
    }

    fn upsert_component_run(&self, row: &ComponentRunRow) -> Result<(), StoreError> {
        row.validate()?;
        let mut tables = self.lock().map_err(StoreError::Write)?;
        tables.runs.insert(row.job_id.clone(), row.clone());
        Ok(())
    }

    fn load_aggregated_log(
        &self,
        date: Date,
        kind: &str,
    ) -> Result<Option<AggregatedLogRow>, StoreError> {
        let tables = self.lock().map_err(StoreError::Read)?;
        Ok(tables.logs.get(&(date, kind.to_string())).cloned())
    }

    fn load_component_run(&self, job_id: &str) -> Result<Option<ComponentRunRow>, StoreError> {
        let tables = self.lock().map_err(StoreError::Read)?;
        Ok(tables.runs.get(job_id).cloned())
    }
}

impl StoreOpener for InMemoryUsageStore {
    fn open(&self) -> Result<Box<dyn UsageStore>, StoreError> {
        let store = self.clone();
        store.ensure_tables()?;
        Ok(Box::new(store))
    }
}
