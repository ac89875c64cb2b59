use std::net::SocketAddr;

use axum::Router;
use common::env::ensure_data_dir;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the stores and assemble the router for a configuration.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let storage = &config.storage;
    ensure_data_dir(
        &storage.data_dir,
        &[storage.products_path().as_path(), storage.carts_path().as_path()],
    )
    .await?;

    let state = AppState::from_storage(storage).await?;
    info!(
        products = %storage.products_path().display(),
        carts = %storage.carts_path().display(),
        "stores opened"
    );
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&config).await?;

    let addr: SocketAddr = config.server.bind_addr().parse()?;
    info!(%addr, "starting storefront server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
