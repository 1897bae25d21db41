use std::sync::Arc;

use anyhow::Context;

use backoffice_api::app::{AppServices, build_app};
use backoffice_api::config::ApiConfig;
use backoffice_api::notifier::LogNotifier;
use backoffice_api::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG.
    let _ = dotenvy::dotenv();
    backoffice_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = AppServices::new(
        Arc::new(Store::new()),
        config.load_hierarchy()?,
        config.load_issuer()?,
        config.load_verifier()?,
        Arc::new(LogNotifier),
    )
    .with_lookup_timeout(config.lookup_timeout);

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
