use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{DbError, DbPool, DbResult, ListParams, repos::ListResult},
    models::{
        CreatePrompt, CreatePromptVersion, PromptFilter, PromptRecord, UpdatePrompt, VersionRef,
    },
};

/// Service layer for user prompts and their versions
#[derive(Clone)]
pub struct PromptService {
    db: Arc<DbPool>,
}

impl PromptService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create a new prompt, starting a new version group
    pub async fn create(&self, user_id: Uuid, input: CreatePrompt) -> DbResult<PromptRecord> {
        self.db.prompts().create(user_id, input).await
    }

    /// Get a prompt owned by `user_id`.
    ///
    /// A prompt owned by someone else is reported as `NotFound`.
    pub async fn get_owned(&self, id: Uuid, user_id: Uuid) -> DbResult<PromptRecord> {
        match self.db.prompts().get_by_id(id).await? {
            Some(prompt) if prompt.user_id == user_id => Ok(prompt),
            _ => Err(DbError::NotFound),
        }
    }

    /// Get a public prompt together with the public versions of its group
    pub async fn get_public(&self, id: Uuid) -> DbResult<(PromptRecord, Vec<VersionRef>)> {
        let prompt = match self.db.prompts().get_by_id(id).await? {
            Some(prompt) if prompt.is_public => prompt,
            _ => return Err(DbError::NotFound),
        };
        let versions = self.public_versions(prompt.group_id).await?;
        Ok((prompt, versions))
    }

    /// List public prompts with pagination
    pub async fn list_public(
        &self,
        params: ListParams,
        filter: PromptFilter,
    ) -> DbResult<ListResult<PromptRecord>> {
        self.db.prompts().list_public(params, filter).await
    }

    /// List a user's prompts with pagination
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<PromptRecord>> {
        self.db.prompts().list_by_user(user_id, params).await
    }

    pub async fn count_by_user(&self, user_id: Uuid) -> DbResult<i64> {
        self.db.prompts().count_by_user(user_id, false).await
    }

    /// Update a prompt owned by `user_id`
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdatePrompt,
    ) -> DbResult<PromptRecord> {
        self.get_owned(id, user_id).await?;
        self.db.prompts().update(id, input).await
    }

    /// Soft-delete a prompt owned by `user_id`
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> DbResult<()> {
        self.get_owned(id, user_id).await?;
        self.db.prompts().delete(id).await
    }

    /// Snapshot a new version of a prompt owned by `user_id`.
    ///
    /// Fields the request leaves out are taken from the parent.
    pub async fn create_version(
        &self,
        parent_id: Uuid,
        user_id: Uuid,
        input: CreatePromptVersion,
    ) -> DbResult<PromptRecord> {
        let parent = self.get_owned(parent_id, user_id).await?;
        let input = input.inherit(&parent);
        self.db
            .prompts()
            .create_version(&parent, user_id, input)
            .await
    }

    /// Every row in the version group of a prompt owned by `viewer`, public
    /// or not, newest first.
    pub async fn version_history(&self, id: Uuid, viewer: Uuid) -> DbResult<Vec<PromptRecord>> {
        let prompt = self.get_owned(id, viewer).await?;
        self.db.prompts().list_group(prompt.group_id, false).await
    }

    /// Public rows of a version group, newest first
    pub async fn public_versions(&self, group_id: Uuid) -> DbResult<Vec<VersionRef>> {
        let rows = self.db.prompts().list_group(group_id, true).await?;
        Ok(rows.iter().map(PromptRecord::version_ref).collect())
    }

    /// Distinct version labels of the public prompts titled `title`, newest
    /// first.
    pub async fn public_version_labels(&self, title: &str) -> DbResult<Vec<String>> {
        if title.trim().is_empty() {
            return Err(DbError::Validation("title must not be empty".into()));
        }
        let rows = self
            .db
            .prompts()
            .list_public_versions_by_title(title)
            .await?;
        Ok(distinct_version_labels(rows))
    }
}

/// Project rows to their version label, keeping the first occurrence of each.
fn distinct_version_labels(rows: impl IntoIterator<Item = VersionRef>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for row in rows {
        if !labels.contains(&row.version) {
            labels.push(row.version);
        }
    }
    labels
}
