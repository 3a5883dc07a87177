//! Integration tests for the Tidelink router
//!
//! This test suite validates:
//! - End-to-end forwarding scenarios across both media
//! - Reachability windows under a driven clock
//! - Concurrent observation ingestion without lost updates
//! - Forwarding never blocking inbound observations

pub mod test_utils;

#[cfg(test)]
mod scenario_tests;
