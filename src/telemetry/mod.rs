//! Tracing setup for binaries and examples.

use tracing_subscriber::fmt;

/// Install a formatted subscriber as the global default.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = fmt().with_target(false).try_init();
}
