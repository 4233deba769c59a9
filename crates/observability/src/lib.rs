//! Shared observability setup for the service binary and tests.

/// Initialize process-wide tracing/logging. Safe to call more than once.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, formats).
pub mod tracing;
