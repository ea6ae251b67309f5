//! Common test utilities for cms-migrate tests

pub mod fixtures;
pub mod mock_api;

// Re-exports for convenience - not all test binaries use all exports
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_api::{Call, Method, MockManagementApi};
