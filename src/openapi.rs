use serde::{Deserialize, Serialize};
#[cfg(feature = "utoipa")]
use utoipa::OpenApi;

#[cfg(feature = "utoipa")]
use crate::{
    collection, db, models,
    routes::{self, health},
};

#[cfg(feature = "utoipa")]
/// OpenAPI documentation for Promptshelf
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Promptshelf API",
        version = "0.1.0",
        description = r#"**Promptshelf** stores and shares AI prompts.

## Overview

- **Collection** (`/api/v1/collection`) serves a bundled, read-only prompt collection parsed from a markdown document, in Chinese or English.
- **Public prompts** (`/api/v1/public/*`) lists prompts users have published, with their public versions.
- **Prompts** (`/api/v1/prompts/*`) lets a signed-in user manage their own prompts and snapshot new versions.

## Authentication

The service sits behind an authenticating proxy. The proxy forwards the signed-in user's id in the identity header (`X-User-Id` by default):

```
X-User-Id: 6f1c3d4e-8a2b-4c5d-9e0f-1a2b3c4d5e6f
```

The collection and public endpoints need no identity.

## Versions

Every prompt belongs to a version group. Creating a version copies the parent, applies the changes, and stores the result as a new prompt in the same group. Version labels are free-form strings.

## Pagination

List endpoints use cursor-based pagination. Pass `next_cursor` from a response as `cursor` to get the next page, or `prev_cursor` together with `direction=backward` to go back.

## Errors

```json
{
  "error": {
    "type": "invalid_request_error",
    "message": "Prompt not found",
    "code": "not_found",
    "request_id": "550e8400-e29b-41d4-a716-446655440000"
  }
}
```
"#,
        license(name = "MIT OR Apache-2.0"),
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "collection", description = "The bundled prompt collection, parsed from markdown on each request."),
        (name = "public", description = "Prompts that users have made public. No identity required."),
        (name = "prompts", description = "The caller's own prompts and their version history."),
        (name = "health", description = "Health check endpoints for monitoring and Kubernetes probes. Use `/health` for detailed status, `/health/live` for liveness probes, and `/health/ready` for readiness probes.")
    ),
    paths(
        health::health_check,
        health::liveness,
        health::readiness,
        routes::collection::list,
        routes::public::list,
        routes::public::get,
        routes::public::version_labels,
        routes::prompts::create,
        routes::prompts::list,
        routes::prompts::get,
        routes::prompts::update,
        routes::prompts::delete,
        routes::prompts::create_version,
        routes::prompts::list_versions,
    ),
    components(schemas(
        ErrorResponse,
        ErrorInfo,
        PaginationMeta,
        db::CursorDirection,
        // Collection
        collection::Language,
        collection::ParsedPromptEntry,
        collection::ParseWarning,
        collection::DropReason,
        routes::collection::CollectionResponse,
        // Prompts
        models::PromptRecord,
        models::VersionRef,
        models::CreatePrompt,
        models::CreatePromptVersion,
        models::UpdatePrompt,
        routes::prompts::PromptListResponse,
        routes::prompts::PromptVersionsResponse,
        routes::public::PublicPromptListResponse,
        routes::public::PublicPromptResponse,
        routes::public::VersionLabelsResponse,
        // Health
        health::HealthStatus,
        health::SubsystemStatus,
        health::ComponentStatus,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[cfg(feature = "utoipa")]
impl ApiDoc {
    pub fn build() -> utoipa::openapi::OpenApi {
        Self::openapi()
    }
}

/// Standard error response body
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
}

/// Error information.
///
/// Format: `{"error": {"type": "...", "message": "...", "param": ..., "code": ...}}`
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ErrorInfo {
    /// Error type classification (e.g., "invalid_request_error", "authentication_error")
    #[cfg_attr(feature = "utoipa", schema(example = "invalid_request_error"))]
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable error message
    #[cfg_attr(feature = "utoipa", schema(example = "Prompt not found"))]
    pub message: String,
    /// Parameter that caused the error (null if not applicable)
    #[cfg_attr(feature = "utoipa", schema(example = json!(null)))]
    pub param: Option<String>,
    /// Machine-readable error code
    #[cfg_attr(feature = "utoipa", schema(example = "not_found"))]
    pub code: Option<String>,
    /// Request ID for correlating errors with logs. Filled in by the
    /// request id middleware.
    #[cfg_attr(
        feature = "utoipa",
        schema(example = "550e8400-e29b-41d4-a716-446655440000")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Create an "invalid_request_error" response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_type("invalid_request_error", code, message)
    }

    /// Create an error response with an explicit error type.
    ///
    /// Error types in use:
    /// - "invalid_request_error" - Invalid parameters or unknown resource
    /// - "authentication_error" - Missing or untrusted identity
    /// - "server_error" - Internal or configuration error
    pub fn with_type(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.into(),
                message: message.into(),
                param: None,
                code: Some(code.into()),
                request_id: None,
            },
        }
    }
}

/// Pagination metadata for list responses using cursor-based pagination.
///
/// Use `next_cursor` and `prev_cursor` to navigate between pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PaginationMeta {
    /// Maximum number of records returned per page.
    #[cfg_attr(feature = "utoipa", schema(example = 50))]
    pub limit: i64,
    /// Whether there are more records available after this page.
    #[cfg_attr(feature = "utoipa", schema(example = true))]
    pub has_more: bool,
    /// Cursor for fetching the next page.
    #[cfg_attr(
        feature = "utoipa",
        schema(example = "MTczMzU4MDgwMDAwMDphYmMxMjM0NS02Nzg5LTAxMjMtNDU2Ny0wMTIzNDU2Nzg5YWI")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Cursor for fetching the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

impl PaginationMeta {
    pub fn with_cursors(
        limit: i64,
        has_more: bool,
        next_cursor: Option<String>,
        prev_cursor: Option<String>,
    ) -> Self {
        Self {
            limit,
            has_more,
            next_cursor,
            prev_cursor,
        }
    }
}

#[cfg(feature = "utoipa")]
/// Security scheme and tag groups modifier
struct SecurityAddon;

#[cfg(feature = "utoipa")]
impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "user_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-User-Id",
                "User id forwarded by the authenticating proxy",
            ))),
        );

        // x-tagGroups for the Scalar sidebar
        let tag_groups = serde_json::json!([
            {
                "name": "Health & Infrastructure",
                "tags": ["health"]
            },
            {
                "name": "Prompts",
                "tags": ["collection", "public", "prompts"]
            }
        ]);

        let extensions = openapi.extensions.get_or_insert_with(Default::default);
        extensions.insert("x-tagGroups".to_string(), tag_groups);
    }
}

#[cfg(all(test, feature = "utoipa"))]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_all_routes() {
        let spec = serde_json::to_value(ApiDoc::build()).unwrap();
        let paths = spec["paths"].as_object().unwrap();

        for path in [
            "/health",
            "/api/v1/collection",
            "/api/v1/public/prompts",
            "/api/v1/public/prompts/{id}",
            "/api/v1/public/versions",
            "/api/v1/prompts",
            "/api/v1/prompts/{id}",
            "/api/v1/prompts/{id}/versions",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }

        assert!(spec["components"]["securitySchemes"]["user_id"].is_object());
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ErrorResponse::new("not_found", "Prompt not found")).unwrap();
        assert_eq!(json["error"]["type"], "invalid_request_error");
        assert_eq!(json["error"]["code"], "not_found");
        assert!(json["error"].get("request_id").is_none());
    }
}
