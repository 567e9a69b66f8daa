//! Log setup for the helper binaries.

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber. `RUST_LOG` overrides the default `warn`
/// level. Calling this twice is harmless; the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
