//! Read API — Binary Entrypoint
//! Boots the Axum HTTP server over the persisted result store. The write
//! path is the separate `fetch-cycle` binary; this process only reads.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use kolkataff_watcher::api::{create_router, AppState};
use kolkataff_watcher::config::Config;
use kolkataff_watcher::metrics::Metrics;
use kolkataff_watcher::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kolkataff_watcher=info,warn")),
        )
        .init();

    let cfg = Config::from_env();
    let store = Store::open(&cfg.data_dir).await?;

    let metrics = Metrics::init(cfg.retention_days);

    let state = AppState {
        store: Arc::new(store),
    };
    let app = create_router(state).merge(metrics.router());

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "read api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
