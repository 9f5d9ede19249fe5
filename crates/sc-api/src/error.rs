//! API error handling
//!
//! Every failure is rendered as `{ errorIdentifier, message, details }`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sc_auth::AuthError;
use sc_core::ScError;
use serde::Serialize;
use serde_json::{json, Value};

const URN: &str = "urn:service-center:api:v1:errors";

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by a service or the authenticator
    Service(ScError),
    /// Body or path that could not be decoded
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Service(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn identifier(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "InvalidRequestBody",
            ApiError::Service(err) => match err {
                ScError::NotFound { .. } => "NotFound",
                ScError::Unauthorized { .. } => "Unauthenticated",
                ScError::Forbidden { .. } => "MissingPermission",
                ScError::InvalidState { .. } => "InvalidState",
                ScError::Validation(_) => "PropertyConstraintViolation",
                ScError::AllocationExhausted { .. } => "AllocationExhausted",
                ScError::Persistence(_) | ScError::Config(_) | ScError::Internal(_) => {
                    "InternalError"
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Service(ScError::NotFound { entity, id }) => {
                format!("{entity} with id {id} not found")
            }
            ApiError::Service(ScError::Validation(errors)) => errors.full_messages().join(", "),
            ApiError::Service(
                ScError::Persistence(_) | ScError::Config(_) | ScError::Internal(_),
            ) => "An internal error occurred".to_string(),
            ApiError::Service(err) => err.to_string(),
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::Service(ScError::Validation(errors)) => json!({
                "errors": errors.errors,
                "baseErrors": errors.base_errors,
            }),
            ApiError::Service(ScError::InvalidState {
                entity, id, current, ..
            }) => json!({
                "entity": entity,
                "id": id,
                "currentStatus": current,
            }),
            ApiError::Service(ScError::NotFound { entity, id }) => json!({
                "entity": entity,
                "id": id,
            }),
            _ => Value::Null,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_identifier: String,
    message: String,
    details: Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = ?self, "request rejected");
        }

        let body = ErrorBody {
            error_identifier: format!("{URN}:{}", self.identifier()),
            message: self.message(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ScError> for ApiError {
    fn from(err: ScError) -> Self {
        ApiError::Service(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Service(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ScError::not_found("JobCard", "JC-0001"), StatusCode::NOT_FOUND),
            (ScError::forbidden("no"), StatusCode::FORBIDDEN),
            (
                ScError::invalid_state("PartOrder", "PO-0001", "Approved", "final"),
                StatusCode::CONFLICT,
            ),
            (ScError::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (ScError::persistence("pool timed out"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_persistence_message_is_opaque() {
        let err = ApiError::from(ScError::persistence("password authentication failed"));
        assert_eq!(err.message(), "An internal error occurred");
        assert_eq!(err.identifier(), "InternalError");
    }

    #[test]
    fn test_invalid_state_details() {
        let err = ApiError::from(ScError::invalid_state(
            "BreakdownRequest",
            7,
            "InProgress",
            "cannot accept a request that is InProgress",
        ));
        assert_eq!(err.details()["currentStatus"], "InProgress");
    }
}
