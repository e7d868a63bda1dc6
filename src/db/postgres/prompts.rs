use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

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

/// A bind value for dynamically assembled queries.
enum Bind {
    Text(String),
    Id(Uuid),
}

pub struct PostgresPromptRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresPromptRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }

    fn parse_prompt(row: &sqlx::postgres::PgRow) -> DbResult<PromptRecord> {
        Ok(PromptRecord {
            id: row.get("id"),
            group_id: row.get("group_id"),
            title: row.get("title"),
            content: row.get("content"),
            description: row.get("description"),
            tags: row.get("tags"),
            version: row.get("version"),
            is_public: row.get("is_public"),
            user_id: row.get("user_id"),
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
        let now = truncate_to_millis(chrono::Utc::now());

        let query = format!(
            r#"
            INSERT INTO prompts (id, group_id, title, content, description, tags, version, is_public, user_id, cover_img, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {}
            "#,
            PROMPT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(group_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.description)
            .bind(&input.tags)
            .bind(&input.version)
            .bind(input.is_public)
            .bind(user_id)
            .bind(&input.cover_img)
            .bind(now)
            .fetch_one(&self.write_pool)
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

        Self::parse_prompt(&row)
    }

    /// Shared keyset listing. `conditions` reference placeholders `$1..$n`
    /// matching `binds` in order.
    async fn list_where(
        &self,
        mut conditions: Vec<String>,
        binds: Vec<Bind>,
        list: &ListParams,
    ) -> DbResult<ListResult<PromptRecord>> {
        let limit = list.effective_limit();
        let fetch_limit = limit + 1;
        let mut param_idx = binds.len() + 1;

        if !list.include_deleted {
            conditions.push("deleted_at IS NULL".to_string());
        }

        let (order, should_reverse) = match &list.cursor {
            Some(_) => {
                let (comparison, order, should_reverse) =
                    list.sort_order.cursor_query_params(list.direction);
                conditions.push(format!(
                    "ROW(created_at, id) {} ROW(${}, ${})",
                    comparison,
                    param_idx,
                    param_idx + 1
                ));
                param_idx += 2;
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
            LIMIT ${}
            "#,
            PROMPT_COLUMNS,
            conditions.join(" AND "),
            order,
            order,
            param_idx
        );

        let mut query_builder = sqlx::query(&query);
        for bind in binds {
            query_builder = match bind {
                Bind::Text(value) => query_builder.bind(value),
                Bind::Id(value) => query_builder.bind(value),
            };
        }
        if let Some(ref c) = list.cursor {
            query_builder = query_builder.bind(c.created_at).bind(c.id);
        }
        let rows = query_builder
            .bind(fetch_limit)
            .fetch_all(&self.read_pool)
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
impl PromptRepo for PostgresPromptRepo {
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
            "SELECT {} FROM prompts WHERE id = $1 AND deleted_at IS NULL",
            PROMPT_COLUMNS
        );
        let result = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.read_pool)
            .await?;

        result.as_ref().map(Self::parse_prompt).transpose()
    }

    async fn list_public(
        &self,
        params: ListParams,
        filter: PromptFilter,
    ) -> DbResult<ListResult<PromptRecord>> {
        let mut conditions = vec!["is_public".to_string()];
        let mut binds = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            binds.push(Bind::Text(like_pattern(search.trim())));
            conditions.push(format!(
                "(title ILIKE ${0} OR COALESCE(description, '') ILIKE ${0})",
                binds.len()
            ));
        }
        if let Some(tag) = filter.tag {
            binds.push(Bind::Text(tag));
            conditions.push(format!("${} = ANY(tags)", binds.len()));
        }

        self.list_where(conditions, binds, &params).await
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<PromptRecord>> {
        self.list_where(
            vec!["user_id = $1".to_string()],
            vec![Bind::Id(user_id)],
            &params,
        )
        .await
    }

    async fn count_by_user(&self, user_id: Uuid, include_deleted: bool) -> DbResult<i64> {
        let query = if include_deleted {
            "SELECT COUNT(*) as count FROM prompts WHERE user_id = $1"
        } else {
            "SELECT COUNT(*) as count FROM prompts WHERE user_id = $1 AND deleted_at IS NULL"
        };

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_one(&self.read_pool)
            .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn list_public_versions_by_title(&self, title: &str) -> DbResult<Vec<VersionRef>> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, created_at
            FROM prompts
            WHERE title = $1 AND is_public AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(title)
        .fetch_all(&self.read_pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| VersionRef {
                id: row.get("id"),
                version: row.get("version"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn list_group(&self, group_id: Uuid, public_only: bool) -> DbResult<Vec<PromptRecord>> {
        let query = format!(
            r#"
            SELECT {}
            FROM prompts
            WHERE group_id = $1 AND deleted_at IS NULL AND ($2 = FALSE OR is_public)
            ORDER BY created_at DESC, id DESC
            "#,
            PROMPT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(group_id)
            .bind(public_only)
            .fetch_all(&self.read_pool)
            .await?;

        rows.iter().map(Self::parse_prompt).collect()
    }

    async fn update(&self, id: Uuid, input: UpdatePrompt) -> DbResult<PromptRecord> {
        if input.is_empty() {
            return self.get_by_id(id).await?.ok_or(DbError::NotFound);
        }

        let query = format!(
            r#"
            UPDATE prompts SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                description = COALESCE($3, description),
                tags = COALESCE($4, tags),
                version = COALESCE($5, version),
                is_public = COALESCE($6, is_public),
                cover_img = COALESCE($7, cover_img),
                updated_at = $8
            WHERE id = $9 AND deleted_at IS NULL
            RETURNING {}
            "#,
            PROMPT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.description)
            .bind(&input.tags)
            .bind(&input.version)
            .bind(input.is_public)
            .bind(&input.cover_img)
            .bind(truncate_to_millis(chrono::Utc::now()))
            .bind(id)
            .fetch_optional(&self.write_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    DbError::Conflict("Version already exists for this prompt".into())
                }
                _ => DbError::from(e),
            })?
            .ok_or(DbError::NotFound)?;

        Self::parse_prompt(&row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE prompts
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.write_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
