use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{DomainError, DomainResult, ValidationError};

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            DomainError::TaskNotFound | DomainError::UserNotFound => StatusCode::NOT_FOUND,
            DomainError::AccessDenied => StatusCode::FORBIDDEN,
            DomainError::UserExists => StatusCode::CONFLICT,
            DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::InternalServer(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Backend detail stays in the log.
            DomainError::InternalServer(detail) => {
                tracing::error!(detail = %detail, "internal server error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Unwrap a JSON body, turning axum's rejection into a 400 with our error shape.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> DomainResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()).into())
}

pub fn path_id(path: Result<Path<Uuid>, PathRejection>) -> DomainResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()).into())
}
