use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use tracing::{debug, error};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::{recommend::recommend_request::RecommendRequest, request_id},
};

pub async fn recommend_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(p): Json<RecommendRequest>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    let started = Instant::now();
    debug!(request_id = %request_id, intent = %p.intent, "recommend_route: start");

    match state.recommender.find_best_solutions(&p.intent).await {
        Ok(outcome) => {
            debug!(
                request_id = %request_id,
                solutions = outcome.solutions.len(),
                latency_ms = started.elapsed().as_millis(),
                "recommend_route: success"
            );
            Ok(ApiResponse::ok(outcome))
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "recommend_route: failed");
            Err(AppError::from(err))
        }
    }
}
