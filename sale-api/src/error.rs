use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use sale_core::CoreError;
use sale_order::LogicError;
use sale_store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<LogicError> for AppError {
    fn from(err: LogicError) -> Self {
        match err {
            LogicError::InvalidTransition { .. } | LogicError::Locked(_) | LogicError::NotQuotation(_) => {
                AppError::Conflict(err.to_string())
            }
            LogicError::ValidationFailed(_) => AppError::Unprocessable(err.to_string()),
            // chain construction and provider failures
            other => AppError::Anyhow(other.into()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => AppError::NotFound(err.to_string()),
            RepositoryError::Duplicate(_) => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::Unprocessable(msg),
            other => AppError::Anyhow(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_errors_map_to_status() {
        let locked: AppError = LogicError::Locked("S00001".to_string()).into();
        assert_eq!(locked.into_response().status(), StatusCode::CONFLICT);

        let invalid: AppError = LogicError::ValidationFailed("no lines".to_string()).into();
        assert_eq!(invalid.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let broken: AppError = LogicError::Construction {
            name: "tracing".to_string(),
            reason: "missing settings".to_string(),
        }
        .into();
        assert_eq!(broken.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_order_is_not_found() {
        let err: AppError = RepositoryError::NotFound(uuid::Uuid::new_v4()).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
