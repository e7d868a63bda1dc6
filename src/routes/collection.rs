use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::{
    AppState,
    collection::{Language, ParseWarning, ParsedPromptEntry},
};

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "utoipa", into_params(parameter_in = Query))]
pub struct CollectionQuery {
    /// `zh` for Chinese; any other value selects English. Defaults to the
    /// configured language.
    pub language: Option<String>,
    /// Only return entries of this category (exact match)
    pub category: Option<String>,
}

/// Parsed prompts of the bundled collection
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CollectionResponse {
    pub prompts: Vec<ParsedPromptEntry>,
    pub language: Language,
    /// Number of prompts returned
    pub total: usize,
    /// Parts of the document that were skipped while parsing
    pub warnings: Vec<ParseWarning>,
}

/// List the bundled public prompt collection
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/api/v1/collection",
    tag = "collection",
    operation_id = "collection_list",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Parsed collection", body = CollectionResponse),
        (status = 404, description = "No document for this language", body = crate::openapi::ErrorResponse),
        (status = 500, description = "Document could not be read", body = crate::openapi::ErrorResponse),
    )
))]
#[tracing::instrument(name = "collection.list", skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let language = query
        .language
        .as_deref()
        .map(Language::from_tag)
        .unwrap_or_else(|| state.collection.default_language());

    let mut report = state.collection.load(language).await?;
    if let Some(category) = query.category.as_deref() {
        report.retain_category(category);
    }

    Ok(Json(CollectionResponse {
        total: report.entries.len(),
        prompts: report.entries,
        language,
        warnings: report.warnings,
    }))
}
