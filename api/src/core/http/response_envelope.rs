//! `{ success, data?, error? }` envelope shared by every route.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Stable, machine-readable code such as `AI_NOT_CONFIGURED`.
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// Points the client at the offending request field.
#[derive(Debug, Default, Serialize)]
pub struct ApiErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiErrorDetail {
    pub fn field(path: Option<String>) -> Self {
        Self { path, hint: None }
    }

    pub fn with_hint(mut self, hint: Option<&str>) -> Self {
        self.hint = hint.map(str::to_string);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.hint.is_none()
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 OK` with `data`.
    pub fn ok(data: T) -> Response {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn with_status(status: StatusCode, data: T) -> Response {
        let body = Self {
            success: true,
            data: Some(data),
            error: None,
        };
        (status, Json(body)).into_response()
    }
}

impl ApiResponse<()> {
    pub fn error(code: &'static str, message: impl Into<String>, details: Vec<ApiErrorDetail>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details: details.into_iter().filter(|d| !d.is_empty()).collect(),
            }),
        }
    }

    pub fn failure(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
        (status, Json(Self::error(code, message, Vec::new()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_envelope_omits_data_and_empty_details() {
        let e = ApiResponse::error(
            "BAD_REQUEST",
            "missing field `intent`",
            vec![ApiErrorDetail::default(), ApiErrorDetail::field(Some("intent".into()))],
        );
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({
                "success": false,
                "error": {
                    "code": "BAD_REQUEST",
                    "message": "missing field `intent`",
                    "details": [{ "path": "intent" }]
                }
            })
        );
    }
}
