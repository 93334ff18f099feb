//! Tracing setup for applications and demos that use the client
//!
//! The client crate only emits `tracing` events; installing a subscriber is
//! left to the application. This helper installs one with:
//! - `RUST_LOG` filtering, falling back to [`DEFAULT_FILTER`]
//! - human-readable console output, or JSON lines when `json` is set

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "marklogic_rs=debug,marklogic_core=info";

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_telemetry(json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()?;
    }

    tracing::debug!("Telemetry initialized (json={})", json);
    Ok(())
}
