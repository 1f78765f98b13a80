//! Shared E2E test helpers.

pub mod fixtures;
pub mod mocks;
