use std::{env, sync::Arc};

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::core::app_state::AppState;
pub use crate::error_handler::AppError;
use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        capabilities::{
            get_capability_route::get_capability_route,
            search_capabilities_route::search_capabilities_route,
        },
        health::health_route::health_route, recommend::recommend_route::recommend_route,
    },
};

/// Routes over a ready state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/recommend", post(recommend_route))
        .route("/capabilities/search", post(search_capabilities_route))
        .route("/capabilities/{resource_name}", get(get_capability_route))
        .route("/health", get(health_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Builds state from the environment and serves on `API_ADDRESS` until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").map_err(|_| AppError::MissingEnv("API_ADDRESS"))?;

    let state = Arc::new(AppState::from_env().await?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
