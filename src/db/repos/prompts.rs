use async_trait::async_trait;
use uuid::Uuid;

use super::{ListParams, ListResult};
use crate::{
    db::error::DbResult,
    models::{CreatePrompt, PromptFilter, PromptRecord, UpdatePrompt, VersionRef},
};

#[async_trait]
pub trait PromptRepo: Send + Sync {
    /// Create a new prompt. The record starts its own version group.
    async fn create(&self, user_id: Uuid, input: CreatePrompt) -> DbResult<PromptRecord>;

    /// Create a new version of `parent`, sharing its version group.
    async fn create_version(
        &self,
        parent: &PromptRecord,
        user_id: Uuid,
        input: CreatePrompt,
    ) -> DbResult<PromptRecord>;

    /// Get a prompt by its ID.
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<PromptRecord>>;

    /// List public prompts, newest first.
    async fn list_public(
        &self,
        params: ListParams,
        filter: PromptFilter,
    ) -> DbResult<ListResult<PromptRecord>>;

    /// List prompts owned by a user, newest first.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<PromptRecord>>;

    /// Count prompts owned by a user.
    async fn count_by_user(&self, user_id: Uuid, include_deleted: bool) -> DbResult<i64>;

    /// Public rows whose title equals `title` exactly, newest first.
    ///
    /// Labels are not deduplicated here.
    async fn list_public_versions_by_title(&self, title: &str) -> DbResult<Vec<VersionRef>>;

    /// Every row in a version group, newest first.
    async fn list_group(&self, group_id: Uuid, public_only: bool) -> DbResult<Vec<PromptRecord>>;

    /// Update a prompt in place.
    async fn update(&self, id: Uuid, input: UpdatePrompt) -> DbResult<PromptRecord>;

    /// Soft-delete a prompt.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
