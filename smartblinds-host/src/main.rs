use std::sync::Arc;

use anyhow::Context;
use smartblinds_host::configs::{Logger, Settings};
use smartblinds_host::run;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Arc::new(Settings::new().context("Failed to load settings")?);

    init_tracing(&settings.logger);
    tracing::info!(blinds = settings.blinds.len(), "Starting smart blinds host");

    run(&settings).await.inspect_err(|e| tracing::error!("{:#}", e))
}

/// `RUST_LOG` wins; otherwise this crate and the HTTP layer log at `logger.level`.
fn init_tracing(logger: &Logger) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let crate_name = env!("CARGO_CRATE_NAME");
        let level = &logger.level;

        EnvFilter::new(format!("{crate_name}={level},tower_http={level}"))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
