//! E2E integration tests for pwa-report-engine.
//!
//! These tests drive the orchestrator and report session end to end with
//! mock suites, a mock manifest resolver, and the in-memory state store.
//!
//! # Test Structure
//!
//! - `helpers/` -- mock suites, resolver, analytics sink, and fixtures
//! - `scenarios/` -- test files organized by scenario
//!
//! # Running
//!
//! ```bash
//! cargo test -p pwa-report-engine --test e2e
//! ```

mod helpers;
mod scenarios;
