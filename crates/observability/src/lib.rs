//! Process-wide tracing setup.

pub mod tracing;

pub use crate::tracing::{LogFormat, LOG_FORMAT_VAR};

/// Initialize tracing from the environment.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    crate::tracing::init();
}
