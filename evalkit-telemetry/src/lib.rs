//! # evalkit-telemetry
//!
//! `tracing` subscriber setup for services embedding Evalkit.
//!
//! The library crates only emit events; installing a subscriber is the
//! embedding service's call, made once at startup:
//!
//! ```rust,ignore
//! evalkit_telemetry::init("eval-worker");
//! ```

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install a console subscriber, honoring `RUST_LOG` and defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init(service_name: &str) {
    init_with_filter(service_name, "info");
}

/// Install a console subscriber with an explicit default filter directive,
/// still overridable through `RUST_LOG`.
pub fn init_with_filter(service_name: &str, default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();

        tracing::info!(service.name = service_name, "telemetry initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("evalkit-test");
        // A second call must not panic on the already-installed subscriber
        init("evalkit-test");
    }
}
