//! Process-wide logging setup shared by the binaries.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize tracing/logging from the environment (`RUST_LOG`, `LOG_FORMAT`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init(subscriber::DEFAULT_FILTER, LogFormat::from_env());
}
