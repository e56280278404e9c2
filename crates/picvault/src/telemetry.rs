//! Tracing subscriber setup for the binary.

use picvault_error::{ConfigError, PicvaultResult};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects debug output for
/// picvault crates. `json` switches to one JSON object per event. Logs go to
/// stderr so command output on stdout stays machine-readable.
pub fn init_tracing(verbose: bool, json: bool) -> PicvaultResult<()> {
    let default_directive = if verbose { "info,picvault=debug" } else { "warn,picvault=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| {
        ConfigError::new(format!("Failed to install tracing subscriber: {}", e)).into()
    })
}
