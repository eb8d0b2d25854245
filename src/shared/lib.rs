// Declare modules at the root level
pub mod classify;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod hap;
pub mod identity;
pub mod memory_host;
pub mod registry;
pub mod station;
pub mod units;
pub mod validators;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the common entry points at root for convenience
pub use dispatch::{apply, apply_all, AppliedWrite, DispatchOutcome};
pub use domain::*;
pub use error::*;
pub use hap::*;
pub use identity::*;
pub use memory_host::{MemoryAccessory, WriteOp, WriteRecord};
pub use registry::ServiceRegistry;
pub use station::WeatherStation;
pub use validators::*;
