use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{collection::CollectionError, db::DbError, openapi::ErrorResponse};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Conflict(String),
    Validation(String),
    BadRequest(String),
    Unauthorized(String),
    /// Endpoint needs a database and none is configured.
    DatabaseRequired,
    Database(DbError),
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("Prompt not found".to_string()),
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::Validation(msg) => ApiError::Validation(msg),
            DbError::NotConfigured => ApiError::DatabaseRequired,
            _ => ApiError::Database(err),
        }
    }
}

impl From<CollectionError> for ApiError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::NotFound(path) => {
                tracing::warn!(path = %path.display(), "Collection document missing");
                ApiError::NotFound("Prompt collection not available".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "not_found",
                msg,
            ),
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                "invalid_request_error",
                "conflict",
                msg,
            ),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_error",
                msg,
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "bad_request",
                msg,
            ),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "unauthorized",
                msg,
            ),
            ApiError::DatabaseRequired => (
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                "not_configured",
                "This endpoint requires a database. Configure [database] to enable it."
                    .to_string(),
            ),
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "database_error",
                    "An internal database error occurred".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse::with_type(error_type, code, message)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_db_not_found_maps_to_404() {
        let response = ApiError::from(DbError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = DbError::Internal("connection string with password".to_string());
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "An internal database error occurred");
    }

    #[tokio::test]
    async fn test_collection_errors() {
        let missing = CollectionError::NotFound(PathBuf::from("/srv/data/prompts_zh.md"));
        let response = ApiError::from(missing).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert!(
            !json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("/srv/data")
        );

        let io = CollectionError::Io(
            PathBuf::from("prompts_zh.md"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let response = ApiError::from(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_and_not_configured() {
        let response = ApiError::from(DbError::Validation("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(DbError::NotConfigured).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
