use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use knowledge_store::KnowledgeError;
use recommender::RecommendError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingEnv(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::failure(status, self.error_code(), self.to_string())
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Store errors seen by handlers.
impl From<KnowledgeError> for AppError {
    fn from(err: KnowledgeError) -> Self {
        let (status, code) = match &err {
            KnowledgeError::EmbeddingUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "EMBEDDING_UNAVAILABLE")
            }
            KnowledgeError::NotInitialized => {
                (StatusCode::SERVICE_UNAVAILABLE, "VECTOR_DB_UNAVAILABLE")
            }
            KnowledgeError::EmptyText => (StatusCode::BAD_REQUEST, "EMPTY_TEXT"),
            KnowledgeError::SemanticSearchFailed(_) | KnowledgeError::Qdrant(_) => {
                (StatusCode::BAD_GATEWAY, "SEARCH_FAILED")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "KNOWLEDGE_STORE_ERROR"),
        };
        AppError::Http {
            status,
            code,
            message: err.to_string(),
        }
    }
}

/// Pipeline errors: caller mistakes are 4xx, misconfiguration is 503, bad
/// upstream output is 502.
impl From<RecommendError> for AppError {
    fn from(err: RecommendError) -> Self {
        let (status, code) = match &err {
            RecommendError::EmptyIntent => (StatusCode::BAD_REQUEST, "EMPTY_INTENT"),
            RecommendError::NoCapabilities(_) => (StatusCode::NOT_FOUND, "NO_CAPABILITIES"),
            RecommendError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "AI_NOT_CONFIGURED"),
            RecommendError::Knowledge(KnowledgeError::EmbeddingUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "EMBEDDING_UNAVAILABLE")
            }
            RecommendError::SolutionParse { .. } => {
                (StatusCode::BAD_GATEWAY, "AI_RESPONSE_INVALID")
            }
            RecommendError::Llm(_) => (StatusCode::BAD_GATEWAY, "AI_REQUEST_FAILED"),
            RecommendError::MissingResourceName { .. } | RecommendError::SchemaFetch { .. } => {
                (StatusCode::BAD_GATEWAY, "SCHEMA_UNAVAILABLE")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "RECOMMENDATION_FAILED"),
        };
        AppError::Http {
            status,
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommend_errors_map_to_status() {
        let e: AppError = RecommendError::EmptyIntent.into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);

        let e: AppError = RecommendError::SolutionParse {
            reason: "invalid JSON".into(),
            excerpt: "{".into(),
            candidates: vec![],
        }
        .into();
        assert_eq!(e.error_code(), "AI_RESPONSE_INVALID");
        assert!(e.to_string().starts_with("Failed to parse AI solution response"));

        let e: AppError = RecommendError::Knowledge(KnowledgeError::EmbeddingUnavailable).into();
        assert_eq!(e.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
