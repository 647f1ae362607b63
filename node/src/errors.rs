// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use traceline_core::CoreError;
use traceline_persistence::JournalError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            EngineError::Core(core) => match core {
                // Validation messages go back verbatim so the engineer
                // sees exactly what the server rejected.
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, core.to_string()),
                CoreError::Conflict(_) => (StatusCode::CONFLICT, core.to_string()),
                CoreError::CrossProjectMismatch { .. } => (StatusCode::CONFLICT, core.to_string()),
                CoreError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, core.to_string()),
            },
            EngineError::Journal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            EngineError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
