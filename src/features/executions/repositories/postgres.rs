use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::{ExecutionEdit, ExecutionRepository};
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::executions::models::{ExecutionStatus, NewExecution, PromptExecution};
use crate::shared::types::JsonMap;

const EXECUTION_COLUMNS: &str = r#"
    id, prompt_id, input_data, output_data, model_name, model_settings,
    execution_time_ms, token_count, cost, status, error_message,
    user_rating, user_feedback, created_at, completed_at
"#;

#[derive(Debug, FromRow)]
struct ExecutionRow {
    id: i64,
    prompt_id: i64,
    input_data: Json<JsonMap>,
    output_data: Json<JsonMap>,
    model_name: String,
    model_settings: Json<JsonMap>,
    execution_time_ms: Option<i64>,
    token_count: Option<i64>,
    cost: Option<Decimal>,
    status: String,
    error_message: Option<String>,
    user_rating: Option<i32>,
    user_feedback: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExecutionRow> for PromptExecution {
    type Error = AppError;

    fn try_from(row: ExecutionRow) -> Result<Self> {
        let status: ExecutionStatus = row.status.parse().map_err(AppError::Internal)?;

        Ok(Self {
            id: row.id,
            prompt_id: row.prompt_id,
            input_data: row.input_data.0,
            output_data: row.output_data.0,
            model_name: row.model_name,
            model_settings: row.model_settings.0,
            execution_time_ms: row.execution_time_ms,
            token_count: row.token_count,
            cost: row.cost,
            status,
            error_message: row.error_message,
            user_rating: row.user_rating,
            user_feedback: row.user_feedback,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

/// PostgreSQL-backed execution storage
#[derive(Clone)]
pub struct PgExecutionRepository {
    pool: PgPool,
}

impl PgExecutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionRepository for PgExecutionRepository {
    async fn record(&self, execution: NewExecution) -> Result<PromptExecution> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to open transaction: {:?}", e);
            AppError::Database(e)
        })?;

        let query = format!(
            r#"
            INSERT INTO prompt_executions (prompt_id, input_data, model_name, model_settings)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            EXECUTION_COLUMNS
        );

        let row = sqlx::query_as::<_, ExecutionRow>(&query)
            .bind(execution.prompt_id)
            .bind(Json(&execution.input_data))
            .bind(&execution.model_name)
            .bind(Json(&execution.model_settings))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| handle_db_error(e, "execution"))?;

        sqlx::query(
            r#"
            UPDATE prompts
            SET usage_count = usage_count + 1, last_used_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(execution.prompt_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to bump usage of prompt {}: {:?}",
                execution.prompt_id,
                e
            );
            AppError::Database(e)
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit execution: {:?}", e);
            AppError::Database(e)
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PromptExecution>> {
        let query = format!(
            "SELECT {} FROM prompt_executions WHERE id = $1",
            EXECUTION_COLUMNS
        );

        sqlx::query_as::<_, ExecutionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get execution {}: {:?}", id, e);
                AppError::Database(e)
            })?
            .map(PromptExecution::try_from)
            .transpose()
    }

    async fn list_for_prompt(
        &self,
        prompt_id: i64,
        status: Option<ExecutionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PromptExecution>, i64)> {
        let status = status.map(|s| s.to_string());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM prompt_executions
            WHERE prompt_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(prompt_id)
        .bind(status.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count executions: {:?}", e);
            AppError::Database(e)
        })?;

        let query = format!(
            r#"
            SELECT {}
            FROM prompt_executions
            WHERE prompt_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            EXECUTION_COLUMNS
        );

        let rows = sqlx::query_as::<_, ExecutionRow>(&query)
            .bind(prompt_id)
            .bind(status.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list executions of prompt {}: {:?}", prompt_id, e);
                AppError::Database(e)
            })?;

        let executions = rows
            .into_iter()
            .map(PromptExecution::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((executions, total))
    }

    async fn update(&self, id: i64, edit: ExecutionEdit) -> Result<Option<PromptExecution>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to open transaction: {:?}", e);
            AppError::Database(e)
        })?;

        let query = format!(
            "SELECT {} FROM prompt_executions WHERE id = $1 FOR UPDATE",
            EXECUTION_COLUMNS
        );
        let row = sqlx::query_as::<_, ExecutionRow>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock execution {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut execution = PromptExecution::try_from(row)?;
        edit(&mut execution)?;

        let query = format!(
            r#"
            UPDATE prompt_executions
            SET output_data = $1,
                execution_time_ms = $2,
                token_count = $3,
                cost = $4,
                status = $5,
                error_message = $6,
                user_rating = $7,
                user_feedback = $8,
                completed_at = $9
            WHERE id = $10
            RETURNING {}
            "#,
            EXECUTION_COLUMNS
        );

        let row = sqlx::query_as::<_, ExecutionRow>(&query)
            .bind(Json(&execution.output_data))
            .bind(execution.execution_time_ms)
            .bind(execution.token_count)
            .bind(execution.cost)
            .bind(execution.status.to_string())
            .bind(&execution.error_message)
            .bind(execution.user_rating)
            .bind(&execution.user_feedback)
            .bind(execution.completed_at)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| handle_db_error(e, "execution"))?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit execution update: {:?}", e);
            AppError::Database(e)
        })?;

        PromptExecution::try_from(row).map(Some)
    }
}
