//! Logging bootstrap built on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset. GPU stack crates are noisy at debug.
pub const DEFAULT_FILTER: &str = "debug,wgpu_core=info,wgpu_hal=info,naga=info";

/// Install a formatting subscriber, honouring `RUST_LOG` when present.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter);
}

/// Install a formatting subscriber with an explicit filter.
pub fn init_with_filter(filter: impl Into<EnvFilter>) {
    if tracing_subscriber::fmt()
        .with_env_filter(filter.into())
        .try_init()
        .is_err()
    {
        tracing::trace!("tracing subscriber already installed");
    }
}
