pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::tracker::Tracker;

pub type SharedTracker = Arc<Tracker>;

pub fn create_router(tracker: SharedTracker) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/fetch", post(routes::fetch_crypto_data))
        .with_state(tracker)
        .layer(CorsLayer::permissive())
}

pub async fn start_server(tracker: Tracker, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(Arc::new(tracker));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
