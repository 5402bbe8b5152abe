use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::{PromptEdit, PromptRepository};
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::prompts::models::{NewPrompt, Prompt, PromptFilter};
use crate::shared::types::JsonMap;

const PROMPT_COLUMNS: &str = r#"
    id, title, description, content, version, is_active, is_template,
    usage_count, rating, variables, settings, prompt_metadata, tags,
    category_id, created_at, updated_at, last_used_at
"#;

// Shared by the page and count queries; binds $1..$5
const PROMPT_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL
           OR title ILIKE '%' || $1 || '%' ESCAPE '\'
           OR description ILIKE '%' || $1 || '%' ESCAPE '\'
           OR content ILIKE '%' || $1 || '%' ESCAPE '\')
      AND ($2::BIGINT IS NULL OR category_id = $2)
      AND ($3::BOOLEAN IS NULL OR is_active = $3)
      AND ($4::BOOLEAN IS NULL OR is_template = $4)
      AND ($5::TEXT IS NULL OR tags @> jsonb_build_array($5::TEXT))
"#;

/// Make `%`, `_` and `\` in a search term match literally under `ESCAPE '\'`
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Row shape with the JSONB columns wrapped for decoding
#[derive(Debug, FromRow)]
struct PromptRow {
    id: i64,
    title: String,
    description: String,
    content: String,
    version: String,
    is_active: bool,
    is_template: bool,
    usage_count: i64,
    rating: Option<Decimal>,
    variables: Json<JsonMap>,
    settings: Json<JsonMap>,
    prompt_metadata: Json<JsonMap>,
    tags: Json<Vec<String>>,
    category_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<PromptRow> for Prompt {
    fn from(row: PromptRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            content: row.content,
            version: row.version,
            is_active: row.is_active,
            is_template: row.is_template,
            usage_count: row.usage_count,
            rating: row.rating,
            variables: row.variables.0,
            settings: row.settings.0,
            prompt_metadata: row.prompt_metadata.0,
            tags: row.tags.0,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_used_at: row.last_used_at,
        }
    }
}

/// PostgreSQL-backed prompt storage
#[derive(Clone)]
pub struct PgPromptRepository {
    pool: PgPool,
}

impl PgPromptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromptRepository for PgPromptRepository {
    async fn insert(&self, prompt: NewPrompt) -> Result<Prompt> {
        let query = format!(
            r#"
            INSERT INTO prompts (
                title, description, content, version, is_template,
                variables, settings, prompt_metadata, tags, category_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PROMPT_COLUMNS
        );

        let row = sqlx::query_as::<_, PromptRow>(&query)
            .bind(&prompt.title)
            .bind(&prompt.description)
            .bind(&prompt.content)
            .bind(&prompt.version)
            .bind(prompt.is_template)
            .bind(Json(&prompt.variables))
            .bind(Json(&prompt.settings))
            .bind(Json(&prompt.prompt_metadata))
            .bind(Json(&prompt.tags))
            .bind(prompt.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "prompt"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Prompt>> {
        let query = format!("SELECT {} FROM prompts WHERE id = $1", PROMPT_COLUMNS);

        let row = sqlx::query_as::<_, PromptRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get prompt {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        Ok(row.map(Prompt::from))
    }

    async fn list(&self, filter: &PromptFilter) -> Result<(Vec<Prompt>, i64)> {
        let search = filter.search.as_deref().map(escape_like);

        let count_query = format!("SELECT COUNT(*) FROM prompts {}", PROMPT_FILTER);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(search.as_deref())
            .bind(filter.category_id)
            .bind(filter.is_active)
            .bind(filter.is_template)
            .bind(filter.tag.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count prompts: {:?}", e);
                AppError::Database(e)
            })?;

        let query = format!(
            r#"
            SELECT {}
            FROM prompts
            {}
            ORDER BY created_at {dir}, id {dir}
            LIMIT $6 OFFSET $7
            "#,
            PROMPT_COLUMNS,
            PROMPT_FILTER,
            dir = filter.sort.as_sql()
        );

        let rows = sqlx::query_as::<_, PromptRow>(&query)
            .bind(search.as_deref())
            .bind(filter.category_id)
            .bind(filter.is_active)
            .bind(filter.is_template)
            .bind(filter.tag.as_deref())
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list prompts: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((rows.into_iter().map(Prompt::from).collect(), total))
    }

    async fn update(&self, id: i64, edit: PromptEdit) -> Result<Option<Prompt>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to open transaction: {:?}", e);
            AppError::Database(e)
        })?;

        let query = format!(
            "SELECT {} FROM prompts WHERE id = $1 FOR UPDATE",
            PROMPT_COLUMNS
        );
        let row = sqlx::query_as::<_, PromptRow>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock prompt {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut prompt = Prompt::from(row);
        edit(&mut prompt)?;

        let query = format!(
            r#"
            UPDATE prompts
            SET title = $1,
                description = $2,
                content = $3,
                version = $4,
                is_active = $5,
                is_template = $6,
                rating = $7,
                variables = $8,
                settings = $9,
                prompt_metadata = $10,
                tags = $11,
                category_id = $12,
                updated_at = NOW()
            WHERE id = $13
            RETURNING {}
            "#,
            PROMPT_COLUMNS
        );

        let row = sqlx::query_as::<_, PromptRow>(&query)
            .bind(&prompt.title)
            .bind(&prompt.description)
            .bind(&prompt.content)
            .bind(&prompt.version)
            .bind(prompt.is_active)
            .bind(prompt.is_template)
            .bind(prompt.rating)
            .bind(Json(&prompt.variables))
            .bind(Json(&prompt.settings))
            .bind(Json(&prompt.prompt_metadata))
            .bind(Json(&prompt.tags))
            .bind(prompt.category_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| handle_db_error(e, "prompt"))?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit prompt update: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(Some(row.into()))
    }

    async fn deactivate(&self, id: i64) -> Result<Option<Prompt>> {
        let query = format!(
            r#"
            UPDATE prompts
            SET is_active = false, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROMPT_COLUMNS
        );

        let row = sqlx::query_as::<_, PromptRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to deactivate prompt {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        Ok(row.map(Prompt::from))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // prompt_executions.prompt_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete prompt {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
