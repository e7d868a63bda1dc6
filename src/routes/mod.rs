pub mod collection;
pub mod error;
pub mod health;
pub mod prompts;
pub mod public;


use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    AppState,
    db::{Cursor, CursorDirection, ListParams, ListResult},
    openapi::PaginationMeta,
    services::Services,
};
use error::ApiError;

/// Routes mounted under `/api`.
pub fn get_api_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/collection", get(collection::list))
        .route("/v1/public/prompts", get(public::list))
        .route("/v1/public/prompts/{id}", get(public::get))
        .route("/v1/public/versions", get(public::version_labels))
        .route("/v1/prompts", post(prompts::create).get(prompts::list))
        .route(
            "/v1/prompts/{id}",
            get(prompts::get)
                .patch(prompts::update)
                .delete(prompts::delete),
        )
        .route(
            "/v1/prompts/{id}/versions",
            post(prompts::create_version).get(prompts::list_versions),
        )
}

pub(crate) fn get_services(state: &AppState) -> Result<&Services, ApiError> {
    state.services.as_ref().ok_or(ApiError::DatabaseRequired)
}

/// Query parameters for cursor-paginated lists.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "utoipa", into_params(parameter_in = Query))]
pub struct ListQuery {
    /// Maximum number of results to return (default 50, max 100)
    pub limit: Option<i64>,
    /// Cursor from a previous page's `next_cursor` or `prev_cursor`
    pub cursor: Option<String>,
    /// Pagination direction: "forward" (default) or "backward"
    pub direction: Option<CursorDirection>,
}

impl ListQuery {
    /// Convert to ListParams, rejecting malformed cursors.
    pub fn into_params(self) -> Result<ListParams, ApiError> {
        let cursor = self
            .cursor
            .as_deref()
            .map(Cursor::decode)
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("Invalid cursor: {e}")))?;

        Ok(ListParams {
            limit: self.limit,
            cursor,
            direction: self.direction.unwrap_or_default(),
            ..Default::default()
        })
    }
}

impl PaginationMeta {
    pub fn from_result<T>(result: &ListResult<T>, limit: i64) -> Self {
        Self::with_cursors(
            limit,
            result.has_more,
            result.cursors.next.as_ref().map(Cursor::encode),
            result.cursors.prev.as_ref().map(Cursor::encode),
        )
    }
}

#[cfg(test)]
mod query_tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let params = ListQuery::default().into_params().unwrap();
        assert!(params.cursor.is_none());
        assert_eq!(params.direction, CursorDirection::Forward);
        assert_eq!(params.effective_limit(), crate::db::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_list_query_rejects_bad_cursor() {
        let query = ListQuery {
            cursor: Some("not a cursor".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_params(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_list_query_roundtrips_cursor() {
        let cursor = Cursor::new(chrono::Utc::now(), uuid::Uuid::new_v4());
        let query = ListQuery {
            cursor: Some(cursor.encode()),
            direction: Some(CursorDirection::Backward),
            limit: Some(10),
        };
        let params = query.into_params().unwrap();
        assert_eq!(params.cursor.map(|c| c.id), Some(cursor.id));
        assert_eq!(params.direction, CursorDirection::Backward);
    }
}
