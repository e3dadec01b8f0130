use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parkline_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    UnprocessableError(String),
    #[error("{0}")]
    InternalServerError(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnprocessableError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::ValidationError(msg),
            CoreError::Conflict(msg) | CoreError::Integrity(msg) => AppError::ConflictError(msg),
            err @ (CoreError::Unavailable(_) | CoreError::InvalidTransition { .. }) => {
                AppError::UnprocessableError(err.to_string())
            }
            CoreError::NotFound(msg) => AppError::NotFoundError(format!("Not found: {}", msg)),
            CoreError::Forbidden(msg) => AppError::AuthorizationError(msg),
            CoreError::Authentication(msg) => AppError::AuthenticationError(msg),
            CoreError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CoreError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_core_error_status_mapping() {
        assert_eq!(status_of(CoreError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(CoreError::Integrity("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(CoreError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(CoreError::Unavailable("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(CoreError::InvalidTransition {
                from: "cancelled".into(),
                to: "active".into()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(CoreError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(CoreError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(CoreError::Authentication("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(CoreError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
