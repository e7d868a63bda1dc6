//! Read-only endpoints for public prompts. No identity required.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ListQuery, error::ApiError, get_services};
use crate::{
    AppState,
    db::CursorDirection,
    models::{PromptFilter, PromptRecord, VersionRef},
    openapi::PaginationMeta,
};

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "utoipa", into_params(parameter_in = Query))]
pub struct PublicListQuery {
    /// Maximum number of results to return (default 50, max 100)
    pub limit: Option<i64>,
    /// Cursor from a previous page's `next_cursor` or `prev_cursor`
    pub cursor: Option<String>,
    /// Pagination direction: "forward" (default) or "backward"
    pub direction: Option<CursorDirection>,
    /// Case-insensitive substring matched against title and description
    pub search: Option<String>,
    /// Only prompts carrying this tag
    pub tag: Option<String>,
}

/// Paginated list of public prompts
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PublicPromptListResponse {
    pub data: Vec<PromptRecord>,
    pub pagination: PaginationMeta,
}

/// A public prompt with the public versions of its group
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PublicPromptResponse {
    #[serde(flatten)]
    pub prompt: PromptRecord,
    /// Public versions of this prompt, newest first
    pub versions: Vec<VersionRef>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "utoipa", into_params(parameter_in = Query))]
pub struct VersionLabelsQuery {
    /// Exact prompt title
    pub title: Option<String>,
}

/// Distinct version labels of the public prompts sharing a title
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct VersionLabelsResponse {
    pub title: String,
    /// Newest first, without duplicates
    pub versions: Vec<String>,
}

/// List public prompts
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/api/v1/public/prompts",
    tag = "public",
    operation_id = "public_prompt_list",
    params(PublicListQuery),
    responses(
        (status = 200, description = "Public prompts, newest first", body = PublicPromptListResponse),
        (status = 400, description = "Invalid cursor", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "public.prompts.list", skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PublicListQuery>,
) -> Result<Json<PublicPromptListResponse>, ApiError> {
    let services = get_services(&state)?;

    let params = ListQuery {
        limit: query.limit,
        cursor: query.cursor,
        direction: query.direction,
    }
    .into_params()?;
    let limit = params.effective_limit();
    let filter = PromptFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        tag: query.tag.filter(|t| !t.is_empty()),
    };

    let result = services.prompts.list_public(params, filter).await?;
    let pagination = PaginationMeta::from_result(&result, limit);

    Ok(Json(PublicPromptListResponse {
        data: result.items,
        pagination,
    }))
}

/// Get a public prompt with its public versions
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/api/v1/public/prompts/{id}",
    tag = "public",
    operation_id = "public_prompt_get",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    responses(
        (status = 200, description = "Prompt found", body = PublicPromptResponse),
        (status = 404, description = "Prompt not found or not public", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "public.prompts.get", skip(state), fields(%id))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicPromptResponse>, ApiError> {
    let services = get_services(&state)?;

    let (prompt, versions) = services.prompts.get_public(id).await?;

    Ok(Json(PublicPromptResponse { prompt, versions }))
}

/// Distinct version labels for a title
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/api/v1/public/versions",
    tag = "public",
    operation_id = "public_version_labels",
    params(VersionLabelsQuery),
    responses(
        (status = 200, description = "Version labels, newest first", body = VersionLabelsResponse),
        (status = 400, description = "Missing or empty title", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "public.versions.labels", skip(state))]
pub async fn version_labels(
    State(state): State<AppState>,
    Query(query): Query<VersionLabelsQuery>,
) -> Result<Json<VersionLabelsResponse>, ApiError> {
    let services = get_services(&state)?;

    let title = query.title.unwrap_or_default();
    let versions = services.prompts.public_version_labels(&title).await?;

    Ok(Json(VersionLabelsResponse {
        title,
        versions,
    }))
}
