use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use tracing::{debug, error};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::request_id,
};

/// `GET /capabilities/{resource_name}`: exact, case-insensitive lookup.
pub async fn get_capability_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_name): Path<String>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    debug!(request_id = %request_id, %resource_name, "get_capability_route: start");

    let found = state
        .stores
        .capabilities
        .find_by_resource_name(&resource_name)
        .await
        .map_err(|err| {
            error!(request_id = %request_id, error = %err, "get_capability_route: lookup failed");
            AppError::from(err)
        })?;

    match found {
        Some(capability) => Ok(ApiResponse::ok(capability)),
        None => Err(AppError::Http {
            status: StatusCode::NOT_FOUND,
            code: "CAPABILITY_NOT_FOUND",
            message: format!("no capability recorded for {resource_name}"),
        }),
    }
}
