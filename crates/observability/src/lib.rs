//! Process-wide logging setup shared by the binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogConfig, LogFormat, ParseLogFormatError};

/// Initialize logging with defaults (JSON output, `RUST_LOG` or `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&LogConfig::default());
}

/// Initialize logging with an explicit configuration.
pub fn init_with(config: &LogConfig) {
    tracing::init(config);
}
