//! Endpoints for the caller's own prompts and their versions.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_valid::Valid;
use serde::Serialize;
use uuid::Uuid;

use super::{ListQuery, error::ApiError, get_services};
use crate::{
    AppState,
    middleware::UserIdentity,
    models::{CreatePrompt, CreatePromptVersion, PromptRecord, UpdatePrompt},
    openapi::PaginationMeta,
};

/// Paginated list of the caller's prompts
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PromptListResponse {
    pub data: Vec<PromptRecord>,
    pub pagination: PaginationMeta,
    /// Total number of prompts the caller owns
    pub total: i64,
}

/// Every version of a prompt, newest first
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PromptVersionsResponse {
    pub group_id: Uuid,
    pub data: Vec<PromptRecord>,
}

/// Create a prompt
#[cfg_attr(feature = "utoipa", utoipa::path(
    post,
    path = "/api/v1/prompts",
    tag = "prompts",
    operation_id = "prompt_create",
    request_body = CreatePrompt,
    responses(
        (status = 201, description = "Prompt created", body = PromptRecord),
        (status = 400, description = "Invalid input", body = crate::openapi::ErrorResponse),
        (status = 401, description = "Missing identity", body = crate::openapi::ErrorResponse),
    ),
    security(("user_id" = []))
))]
#[tracing::instrument(name = "prompts.create", skip(state, input), fields(user_id = %identity.user_id))]
pub async fn create(
    State(state): State<AppState>,
    identity: UserIdentity,
    Valid(Json(input)): Valid<Json<CreatePrompt>>,
) -> Result<(StatusCode, Json<PromptRecord>), ApiError> {
    let services = get_services(&state)?;

    let prompt = services.prompts.create(identity.user_id, input).await?;
    tracing::info!(prompt_id = %prompt.id, group_id = %prompt.group_id, "Prompt created");

    Ok((StatusCode::CREATED, Json(prompt)))
}

/// List the caller's prompts
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/api/v1/prompts",
    tag = "prompts",
    operation_id = "prompt_list",
    params(ListQuery),
    responses(
        (status = 200, description = "The caller's prompts, newest first", body = PromptListResponse),
        (status = 401, description = "Missing identity", body = crate::openapi::ErrorResponse),
    ),
    security(("user_id" = []))
))]
#[tracing::instrument(name = "prompts.list", skip(state, query), fields(user_id = %identity.user_id))]
pub async fn list(
    State(state): State<AppState>,
    identity: UserIdentity,
    Query(query): Query<ListQuery>,
) -> Result<Json<PromptListResponse>, ApiError> {
    let services = get_services(&state)?;

    let params = query.into_params()?;
    let limit = params.effective_limit();

    let result = services
        .prompts
        .list_by_user(identity.user_id, params)
        .await?;
    let total = services.prompts.count_by_user(identity.user_id).await?;
    let pagination = PaginationMeta::from_result(&result, limit);

    Ok(Json(PromptListResponse {
        data: result.items,
        pagination,
        total,
    }))
}

/// Get one of the caller's prompts
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/api/v1/prompts/{id}",
    tag = "prompts",
    operation_id = "prompt_get",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    responses(
        (status = 200, description = "Prompt found", body = PromptRecord),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
    ),
    security(("user_id" = []))
))]
#[tracing::instrument(name = "prompts.get", skip(state), fields(%id, user_id = %identity.user_id))]
pub async fn get(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<PromptRecord>, ApiError> {
    let services = get_services(&state)?;

    let prompt = services.prompts.get_owned(id, identity.user_id).await?;

    Ok(Json(prompt))
}

/// Update one of the caller's prompts in place
#[cfg_attr(feature = "utoipa", utoipa::path(
    patch,
    path = "/api/v1/prompts/{id}",
    tag = "prompts",
    operation_id = "prompt_update",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    request_body = UpdatePrompt,
    responses(
        (status = 200, description = "Prompt updated", body = PromptRecord),
        (status = 400, description = "Invalid input", body = crate::openapi::ErrorResponse),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
        (status = 409, description = "Version label already used in this group", body = crate::openapi::ErrorResponse),
    ),
    security(("user_id" = []))
))]
#[tracing::instrument(name = "prompts.update", skip(state, input), fields(%id, user_id = %identity.user_id))]
pub async fn update(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<Uuid>,
    Valid(Json(input)): Valid<Json<UpdatePrompt>>,
) -> Result<Json<PromptRecord>, ApiError> {
    let services = get_services(&state)?;

    let prompt = services
        .prompts
        .update(id, identity.user_id, input)
        .await?;

    Ok(Json(prompt))
}

/// Delete one of the caller's prompts
#[cfg_attr(feature = "utoipa", utoipa::path(
    delete,
    path = "/api/v1/prompts/{id}",
    tag = "prompts",
    operation_id = "prompt_delete",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    responses(
        (status = 204, description = "Prompt deleted"),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
    ),
    security(("user_id" = []))
))]
#[tracing::instrument(name = "prompts.delete", skip(state), fields(%id, user_id = %identity.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let services = get_services(&state)?;

    services.prompts.delete(id, identity.user_id).await?;
    tracing::info!(prompt_id = %id, "Prompt deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Create a new version of one of the caller's prompts
#[cfg_attr(feature = "utoipa", utoipa::path(
    post,
    path = "/api/v1/prompts/{id}/versions",
    tag = "prompts",
    operation_id = "prompt_version_create",
    params(("id" = Uuid, Path, description = "ID of the prompt to branch from")),
    request_body = CreatePromptVersion,
    responses(
        (status = 201, description = "Version created", body = PromptRecord),
        (status = 400, description = "Invalid input", body = crate::openapi::ErrorResponse),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
        (status = 409, description = "Version label already used in this group", body = crate::openapi::ErrorResponse),
    ),
    security(("user_id" = []))
))]
#[tracing::instrument(name = "prompts.versions.create", skip(state, input), fields(%id, user_id = %identity.user_id))]
pub async fn create_version(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<Uuid>,
    Valid(Json(input)): Valid<Json<CreatePromptVersion>>,
) -> Result<(StatusCode, Json<PromptRecord>), ApiError> {
    let services = get_services(&state)?;

    let prompt = services
        .prompts
        .create_version(id, identity.user_id, input)
        .await?;
    tracing::info!(
        prompt_id = %prompt.id,
        group_id = %prompt.group_id,
        version = %prompt.version,
        "Prompt version created"
    );

    Ok((StatusCode::CREATED, Json(prompt)))
}

/// List every version of one of the caller's prompts
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/api/v1/prompts/{id}/versions",
    tag = "prompts",
    operation_id = "prompt_version_list",
    params(("id" = Uuid, Path, description = "ID of any version of the prompt")),
    responses(
        (status = 200, description = "Versions, newest first", body = PromptVersionsResponse),
        (status = 404, description = "Prompt not found", body = crate::openapi::ErrorResponse),
    ),
    security(("user_id" = []))
))]
#[tracing::instrument(name = "prompts.versions.list", skip(state), fields(%id, user_id = %identity.user_id))]
pub async fn list_versions(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<PromptVersionsResponse>, ApiError> {
    let services = get_services(&state)?;

    let data = services
        .prompts
        .version_history(id, identity.user_id)
        .await?;
    let group_id = data.first().map(|p| p.group_id).unwrap_or(id);

    Ok(Json(PromptVersionsResponse { group_id, data }))
}
