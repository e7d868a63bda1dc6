use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{
            ListParams, ListResult, PageCursors, PromptRepo, cursor_from_row, like_pattern,
            truncate_to_millis,
        },
    },
    models::{CreatePrompt, PromptFilter, PromptRecord, UpdatePrompt, VersionRef},
};

const PROMPT_COLUMNS: &str = "id, group_id, title, content, description, tags, version, is_public, user_id, cover_img, created_at, updated_at";

pub struct SqlitePromptRepo {
    pool: SqlitePool,
}

impl SqlitePromptRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_prompt(row: &sqlx::sqlite::SqliteRow) -> DbResult<PromptRecord> {
        let tags: String = row.get("tags");
        let tags: Vec<String> = serde_json::from_str(&tags)
            .map_err(|e| DbError::Internal(format!("Failed to parse tags: {}", e)))?;

        Ok(PromptRecord {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            group_id: parse_uuid(&row.get::<String, _>("group_id"))?,
            title: row.get("title"),
            content: row.get("content"),
            description: row.get("description"),
            tags,
            version: row.get("version"),
            is_public: row.get("is_public"),
            user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
            cover_img: row.get("cover_img"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn insert(
        &self,
        group_id: Option<Uuid>,
        user_id: Uuid,
        input: CreatePrompt,
    ) -> DbResult<PromptRecord> {
        let id = Uuid::new_v4();
        let group_id = group_id.unwrap_or(id);
        let now = truncate_to_millis(Utc::now());
        let tags_json = serde_json::to_string(&input.tags)?;

        sqlx::query(
            r#"
            INSERT INTO prompts (id, group_id, title, content, description, tags, version, is_public, user_id, cover_img, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(group_id.to_string())
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.description)
        .bind(&tags_json)
        .bind(&input.version)
        .bind(input.is_public)
        .bind(user_id.to_string())
        .bind(&input.cover_img)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict(format!(
                    "Version '{}' already exists for this prompt",
                    input.version
                ))
            }
            _ => DbError::from(e),
        })?;

        Ok(PromptRecord {
            id,
            group_id,
            title: input.title,
            content: input.content,
            description: input.description,
            tags: input.tags,
            version: input.version,
            is_public: input.is_public,
            user_id,
            cover_img: input.cover_img,
            created_at: now,
            updated_at: now,
        })
    }

    /// Shared keyset listing. `conditions` are ANDed together and their
    /// placeholders are bound from `params` in order.
    async fn list_where(
        &self,
        mut conditions: Vec<String>,
        params: Vec<String>,
        list: &ListParams,
    ) -> DbResult<ListResult<PromptRecord>> {
        let limit = list.effective_limit();
        let fetch_limit = limit + 1;

        if !list.include_deleted {
            conditions.push("deleted_at IS NULL".to_string());
        }

        let (order, should_reverse) = match &list.cursor {
            Some(_) => {
                let (comparison, order, should_reverse) =
                    list.sort_order.cursor_query_params(list.direction);
                conditions.push(format!("(created_at, id) {} (?, ?)", comparison));
                (order, should_reverse)
            }
            None => (list.sort_order.as_sql(), false),
        };

        let query = format!(
            r#"
            SELECT {}
            FROM prompts
            WHERE {}
            ORDER BY created_at {}, id {}
            LIMIT ?
            "#,
            PROMPT_COLUMNS,
            conditions.join(" AND "),
            order,
            order
        );

        let mut query_builder = sqlx::query(&query);
        for param in &params {
            query_builder = query_builder.bind(param);
        }
        if let Some(ref c) = list.cursor {
            query_builder = query_builder.bind(c.created_at).bind(c.id.to_string());
        }
        let rows = query_builder
            .bind(fetch_limit)
            .fetch_all(&self.pool)
            .await?;

        let has_more = rows.len() as i64 > limit;
        let mut items: Vec<PromptRecord> = rows
            .iter()
            .take(limit as usize)
            .map(Self::parse_prompt)
            .collect::<DbResult<Vec<_>>>()?;

        if should_reverse {
            items.reverse();
        }

        let cursors = PageCursors::from_items(
            &items,
            has_more,
            list.direction,
            list.cursor.as_ref(),
            |p| cursor_from_row(p.created_at, p.id),
        );

        Ok(ListResult::new(items, has_more, cursors))
    }
}

#[async_trait]
impl PromptRepo for SqlitePromptRepo {
    async fn create(&self, user_id: Uuid, input: CreatePrompt) -> DbResult<PromptRecord> {
        self.insert(None, user_id, input).await
    }

    async fn create_version(
        &self,
        parent: &PromptRecord,
        user_id: Uuid,
        input: CreatePrompt,
    ) -> DbResult<PromptRecord> {
        self.insert(Some(parent.group_id), user_id, input).await
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<PromptRecord>> {
        let query = format!(
            "SELECT {} FROM prompts WHERE id = ? AND deleted_at IS NULL",
            PROMPT_COLUMNS
        );
        let result = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        result.as_ref().map(Self::parse_prompt).transpose()
    }

    async fn list_public(
        &self,
        params: ListParams,
        filter: PromptFilter,
    ) -> DbResult<ListResult<PromptRecord>> {
        let mut conditions = vec!["is_public = 1".to_string()];
        let mut binds = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push(
                r"(title LIKE ? ESCAPE '\' OR COALESCE(description, '') LIKE ? ESCAPE '\')"
                    .to_string(),
            );
            let pattern = like_pattern(search.trim());
            binds.push(pattern.clone());
            binds.push(pattern);
        }
        if let Some(tag) = filter.tag {
            conditions.push(
                "EXISTS (SELECT 1 FROM json_each(prompts.tags) WHERE json_each.value = ?)"
                    .to_string(),
            );
            binds.push(tag);
        }

        self.list_where(conditions, binds, &params).await
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<PromptRecord>> {
        self.list_where(
            vec!["user_id = ?".to_string()],
            vec![user_id.to_string()],
            &params,
        )
        .await
    }

    async fn count_by_user(&self, user_id: Uuid, include_deleted: bool) -> DbResult<i64> {
        let query = if include_deleted {
            "SELECT COUNT(*) as count FROM prompts WHERE user_id = ?"
        } else {
            "SELECT COUNT(*) as count FROM prompts WHERE user_id = ? AND deleted_at IS NULL"
        };

        let row = sqlx::query(query)
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn list_public_versions_by_title(&self, title: &str) -> DbResult<Vec<VersionRef>> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, created_at
            FROM prompts
            WHERE title = ? AND is_public = 1 AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(title)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(VersionRef {
                    id: parse_uuid(&row.get::<String, _>("id"))?,
                    version: row.get("version"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    async fn list_group(&self, group_id: Uuid, public_only: bool) -> DbResult<Vec<PromptRecord>> {
        let visibility = if public_only { "AND is_public = 1" } else { "" };
        let query = format!(
            r#"
            SELECT {}
            FROM prompts
            WHERE group_id = ? AND deleted_at IS NULL {}
            ORDER BY created_at DESC, id DESC
            "#,
            PROMPT_COLUMNS, visibility
        );

        let rows = sqlx::query(&query)
            .bind(group_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_prompt).collect()
    }

    async fn update(&self, id: Uuid, input: UpdatePrompt) -> DbResult<PromptRecord> {
        if input.is_empty() {
            return self.get_by_id(id).await?.ok_or(DbError::NotFound);
        }

        let now = truncate_to_millis(Utc::now());

        let mut set_clauses = vec!["updated_at = ?"];
        if input.title.is_some() {
            set_clauses.push("title = ?");
        }
        if input.content.is_some() {
            set_clauses.push("content = ?");
        }
        if input.description.is_some() {
            set_clauses.push("description = ?");
        }
        if input.tags.is_some() {
            set_clauses.push("tags = ?");
        }
        if input.version.is_some() {
            set_clauses.push("version = ?");
        }
        if input.is_public.is_some() {
            set_clauses.push("is_public = ?");
        }
        if input.cover_img.is_some() {
            set_clauses.push("cover_img = ?");
        }

        let query = format!(
            "UPDATE prompts SET {} WHERE id = ? AND deleted_at IS NULL",
            set_clauses.join(", ")
        );

        let mut query_builder = sqlx::query(&query).bind(now);
        if let Some(ref title) = input.title {
            query_builder = query_builder.bind(title);
        }
        if let Some(ref content) = input.content {
            query_builder = query_builder.bind(content);
        }
        if let Some(ref description) = input.description {
            query_builder = query_builder.bind(description);
        }
        if let Some(ref tags) = input.tags {
            query_builder = query_builder.bind(serde_json::to_string(tags)?);
        }
        if let Some(ref version) = input.version {
            query_builder = query_builder.bind(version);
        }
        if let Some(is_public) = input.is_public {
            query_builder = query_builder.bind(is_public);
        }
        if let Some(ref cover_img) = input.cover_img {
            query_builder = query_builder.bind(cover_img);
        }

        let result = query_builder
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    DbError::Conflict("Version already exists for this prompt".into())
                }
                _ => DbError::from(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE prompts
            SET deleted_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
