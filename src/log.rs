//! Logging setup for test binaries
//!
//! The crate logs through `tracing`: deadline and capture guards at `trace`,
//! program start/exit and path resolution at `debug`.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn";

/// Install a fmt subscriber writing through the test harness
///
/// Honors `RUST_LOG`. Calling it more than once is harmless.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_test_writer()
        .try_init();
}
