use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::debug;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::health::health_response::{CollectionHealth, HealthResponse},
};

pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let stores = &state.stores;
    let (capabilities, patterns, policies, llm) = tokio::join!(
        stores.capabilities.health_check(),
        stores.patterns.health_check(),
        stores.policies.health_check(),
        state.llm.health_all(),
    );

    let vector_db = vec![
        CollectionHealth {
            name: stores.capabilities.collection_name().to_string(),
            ok: capabilities,
        },
        CollectionHealth {
            name: stores.patterns.collection_name().to_string(),
            ok: patterns,
        },
        CollectionHealth {
            name: stores.policies.collection_name().to_string(),
            ok: policies,
        },
    ];
    let llm_initialized = state.llm.is_initialized();
    let body = HealthResponse {
        healthy: capabilities && llm_initialized,
        vector_db,
        embedding: stores.capabilities.embedding_status(),
        llm_initialized,
        llm,
    };
    debug!(healthy = body.healthy, "health_route");

    let status = if body.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    ApiResponse::with_status(status, body)
}
