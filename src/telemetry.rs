// Logging setup for binaries and ad-hoc tools built on the client

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "tour_booking_client=info";

/// Installs a compact fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to [`DEFAULT_FILTER`] when `RUST_LOG` is unset or invalid. Safe to call
/// more than once; later calls leave the first subscriber in place and return `false`.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
