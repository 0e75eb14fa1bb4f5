// crates/certsuite-usage-core/src/core/backend.rs
// ============================================================================
// Module: Store Backend Selection
// Description: Closed set of supported persistence backends.
// Purpose: Resolve the backend flag with an explicit default.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The backend flag is free text in the environment (`DB_CHOICE`). It is
//! resolved once into [`StoreBackend`]; unrecognized or missing values fall
//! back to [`StoreBackend::Sqlite`], and [`BackendResolution`] records whether
//! that fallback happened so callers can report it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Supported store backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// Embedded file-backed `SQLite` store.
    #[default]
    Sqlite,
    /// Networked Postgres server.
    Postgres,
}

/// Outcome of resolving a backend flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendResolution {
    /// The flag named a supported backend.
    Recognized(StoreBackend),
    /// The flag was missing or blank; the default applies.
    Defaulted,
    /// The flag was not recognized; the default applies.
    Unrecognized(String),
}

impl BackendResolution {
    /// Returns the backend to use.
    #[must_use]
    pub const fn backend(&self) -> StoreBackend {
        match self {
            Self::Recognized(backend) => *backend,
            Self::Defaulted | Self::Unrecognized(_) => StoreBackend::Sqlite,
        }
    }
}

impl StoreBackend {
    /// Resolves a backend flag.
    ///
    /// `sqlite` and `local` select [`StoreBackend::Sqlite`]; `postgres`,
    /// `remote`, and `aws` select [`StoreBackend::Postgres`]. Matching is
    /// case-insensitive.
    #[must_use]
    pub fn resolve(flag: Option<&str>) -> BackendResolution {
        let Some(raw) = flag.map(str::trim).filter(|value| !value.is_empty()) else {
            return BackendResolution::Defaulted;
        };
        match raw.to_ascii_lowercase().as_str() {
            "sqlite" | "local" => BackendResolution::Recognized(Self::Sqlite),
            "postgres" | "postgresql" | "remote" | "aws" => {
                BackendResolution::Recognized(Self::Postgres)
            }
            _ => BackendResolution::Unrecognized(raw.to_string()),
        }
    }

    /// Resolves a backend flag, discarding how the result was reached.
    #[must_use]
    pub fn from_flag(flag: Option<&str>) -> Self {
        Self::resolve(flag).backend()
    }

    /// Returns the canonical flag value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
