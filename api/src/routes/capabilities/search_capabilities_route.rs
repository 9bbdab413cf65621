use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use knowledge_store::SearchOptions;
use tracing::{debug, error};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::{capabilities::search_capabilities_request::SearchCapabilitiesRequest, request_id},
};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

pub async fn search_capabilities_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(p): Json<SearchCapabilitiesRequest>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    if p.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".into()));
    }
    let opts = SearchOptions {
        limit: p.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        score_threshold: p.score_threshold.unwrap_or(0.0).max(0.0),
    };
    debug!(request_id = %request_id, query = %p.query, limit = opts.limit, "search_capabilities_route: start");

    let hits = state
        .stores
        .capabilities
        .search_data(&p.query, opts)
        .await
        .map_err(|err| {
            error!(request_id = %request_id, error = %err, "search_capabilities_route: search failed");
            AppError::from(err)
        })?;

    debug!(request_id = %request_id, hits = hits.len(), "search_capabilities_route: success");
    Ok(ApiResponse::ok(hits))
}
