use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validators::validate_tags;

/// Version label given to a prompt when the caller does not supply one.
pub const DEFAULT_VERSION: &str = "1.0.0";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// A stored prompt. Every snapshot of a logical prompt is its own record;
/// snapshots of the same prompt share a `group_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PromptRecord {
    pub id: Uuid,
    /// Identifier shared by every version of this prompt
    pub group_id: Uuid,
    pub title: String,
    /// The prompt text itself
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Free-form version label, e.g. "1.0.0"
    pub version: String,
    pub is_public: bool,
    /// Owner of the record
    pub user_id: Uuid,
    /// URL of the cover image, produced by an external upload service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromptRecord {
    pub fn version_ref(&self) -> VersionRef {
        VersionRef {
            id: self.id,
            version: self.version.clone(),
            created_at: self.created_at,
        }
    }
}

/// The slice of a record needed to list it as one version of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct VersionRef {
    pub id: Uuid,
    pub version: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request to create a new prompt (starts a new version group)
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CreatePrompt {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    #[serde(default = "default_version")]
    #[validate(length(min = 1, max = 50))]
    pub version: String,
    #[serde(default)]
    pub is_public: bool,
    #[validate(length(max = 2048))]
    pub cover_img: Option<String>,
}

/// Request to snapshot a new version of an existing prompt.
///
/// Fields left out are inherited from the parent record.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CreatePromptVersion {
    #[validate(length(min = 1, max = 50))]
    pub version: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    #[validate(length(max = 2048))]
    pub cover_img: Option<String>,
}

impl CreatePromptVersion {
    /// Resolve the full field set of the new version against its parent.
    pub fn inherit(self, parent: &PromptRecord) -> CreatePrompt {
        CreatePrompt {
            title: self.title.unwrap_or_else(|| parent.title.clone()),
            content: self.content,
            description: self.description.or_else(|| parent.description.clone()),
            tags: self.tags.unwrap_or_else(|| parent.tags.clone()),
            version: self.version,
            is_public: self.is_public.unwrap_or(parent.is_public),
            cover_img: self.cover_img.or_else(|| parent.cover_img.clone()),
        }
    }
}

/// Request to update a prompt in place
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UpdatePrompt {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(length(min = 1, max = 50))]
    pub version: Option<String>,
    pub is_public: Option<bool>,
    #[validate(length(max = 2048))]
    pub cover_img: Option<String>,
}

impl UpdatePrompt {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.version.is_none()
            && self.is_public.is_none()
            && self.cover_img.is_none()
    }
}

/// Filters for listing public prompts.
#[derive(Debug, Clone, Default)]
pub struct PromptFilter {
    /// Case-insensitive substring matched against title and description
    pub search: Option<String>,
    /// Exact tag match
    pub tag: Option<String>,
}
