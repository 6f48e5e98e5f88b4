//! Tracing/logging setup shared by the binaries.

/// Initialize process-wide tracing with the given default filter.
///
/// `RUST_LOG`, when set, wins over `default_filter`. Safe to call multiple
/// times; subsequent calls are no-ops.
pub fn init(default_filter: &str) {
    tracing::init(default_filter);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
