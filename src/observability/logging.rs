//! Structured logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a fmt subscriber with `RUST_LOG` filtering for hosts (and tests)
/// that do not bring their own. Repeated calls after the first are no-ops.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guardrail=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
