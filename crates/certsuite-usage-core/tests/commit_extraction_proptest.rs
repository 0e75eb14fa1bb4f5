// crates/certsuite-usage-core/tests/commit_extraction_proptest.rs
// ============================================================================
// Module: Commit Extraction Property Tests
// Description: Property coverage for component name parsing and parsers.
// Purpose: Ensure extraction and timestamp parsing never panic.
// Dependencies: certsuite-usage-core, proptest
// ============================================================================

//! ## Overview
//! Property tests over arbitrary component names and datetime strings.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use certsuite_usage_core::UNKNOWN_COMMIT;
use certsuite_usage_core::parse_ci_timestamp;
use certsuite_usage_core::parse_registry_datetime;
use certsuite_usage_core::runtime::extract_commit_hash;
use proptest::prelude::*;

proptest! {
    #[test]
    fn commit_is_second_token(name in "[a-z-]{1,20}", commit in "[0-9a-f]{7,40}", tail in "( [a-z]{1,5}){0,3}") {
        let component = format!("{name} {commit}{tail}");
        prop_assert_eq!(extract_commit_hash(&component), commit);
    }

    #[test]
    fn single_token_yields_unknown(name in "[^\\s]{0,30}") {
        prop_assert_eq!(extract_commit_hash(&name), UNKNOWN_COMMIT);
    }

    #[test]
    fn arbitrary_datetimes_do_not_panic(value in ".{0,64}") {
        let _ = parse_registry_datetime(&value);
        let _ = parse_ci_timestamp(&value);
    }
}
