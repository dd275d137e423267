mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::maps::{HttpBackend, MapsResolver, SharedBackend};

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/expand", get(handlers::expand))
        .route("/api/search", get(handlers::search))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Router over the real upstream services.
pub fn router_from_config(config: &Config) -> Router {
    let backend: SharedBackend = Box::new(HttpBackend::new(config));
    let state = Arc::new(AppState {
        resolver: MapsResolver::configured(backend, config),
    });
    build_router(state)
}

pub async fn start(host: &str, port: u16, config: &Config) -> std::io::Result<()> {
    let app = router_from_config(config);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(%addr, error = %e, "cannot bind");
        e
    })?;

    info!(%addr, mode = %config.mode, "maps-unshort server listening");
    axum::serve(listener, app).await
}
