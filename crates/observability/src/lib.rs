//! Process-wide logging setup shared by the backoffice binaries.

/// Subscriber configuration (filter, output format).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, LogFormat};

/// Install the global subscriber using `RUST_LOG` and `LOG_FORMAT`.
///
/// Calling this more than once is harmless; later calls keep the first
/// subscriber.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
