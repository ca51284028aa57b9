pub mod config;

pub use config::{ConfigValidationError, ServiceConfig, ValidationResult, DEFAULT_BASE_URL};

use anyhow::Result;

/// Install the default tracing subscriber.
///
/// Honors `RUST_LOG`, falling back to `info`. Fails if a global subscriber
/// is already set.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("calfeed initialized");
    Ok(())
}
