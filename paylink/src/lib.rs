pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

use anyhow::Context;
use std::net::SocketAddr;
use tracing::info;

use crate::api::ApiSettings;
use crate::store::StoreMode;

/// Start the paylink service: validate configuration, open the selected
/// store backend and serve the API until the process is stopped.
pub async fn run() -> anyhow::Result<()> {
    // load .env for local development (if present)
    dotenvy::dotenv().ok();

    let validation = config::validate_config();
    validation.print_summary();
    anyhow::ensure!(validation.valid, "configuration invalid, refusing to start");

    let mode = StoreMode::from_str(&std::env::var("STORE_MODE").unwrap_or_else(|_| "local".into()));
    info!("selected store backend: {:?}", mode);

    // The store is constructed here and handed to the router; nothing else
    // in the process can reach the backing collection.
    let store = store::create_store(mode, None)
        .await
        .context("failed to initialize link store")?;

    let api_addr = std::env::var("API_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let api_addr: SocketAddr = api_addr.parse().context("API_ADDR invalid")?;

    let base_url =
        std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".into());
    let router = api::router(store, ApiSettings { base_url });

    info!("paylink API listening on {}", api_addr);
    axum::Server::bind(&api_addr)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("API server crashed")?;

    Ok(())
}
