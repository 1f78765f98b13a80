//! E2E test scenarios.

mod analysis_flow;
mod fault_isolation;
mod retest_flow;
mod run_fencing;
mod session_flow;
