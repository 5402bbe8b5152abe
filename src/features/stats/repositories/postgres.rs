use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use super::StatsRepository;
use crate::core::error::{AppError, Result};
use crate::features::stats::dtos::MostUsedCategoryBy;
use crate::features::stats::models::PromptStats;

#[derive(Debug, FromRow)]
struct CountsRow {
    total_prompts: i64,
    active_prompts: i64,
    template_prompts: i64,
    total_executions: i64,
    avg_rating: Option<Decimal>,
    recent_executions: i64,
}

const MOST_USED_BY_EXECUTIONS: &str = r#"
    SELECT c.name
    FROM prompt_categories c
    JOIN prompts p ON p.category_id = c.id
    JOIN prompt_executions e ON e.prompt_id = p.id
    GROUP BY c.id, c.name
    ORDER BY COUNT(e.id) DESC, c.name ASC
    LIMIT 1
"#;

const MOST_USED_BY_PROMPTS: &str = r#"
    SELECT c.name
    FROM prompt_categories c
    JOIN prompts p ON p.category_id = c.id
    GROUP BY c.id, c.name
    ORDER BY COUNT(p.id) DESC, c.name ASC
    LIMIT 1
"#;

/// PostgreSQL-backed stats queries
#[derive(Clone)]
pub struct PgStatsRepository {
    pool: PgPool,
}

impl PgStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn prompt_stats(
        &self,
        most_used_by: MostUsedCategoryBy,
        recent_since: DateTime<Utc>,
    ) -> Result<PromptStats> {
        let counts = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM prompts) AS total_prompts,
                (SELECT COUNT(*) FROM prompts WHERE is_active) AS active_prompts,
                (SELECT COUNT(*) FROM prompts WHERE is_template) AS template_prompts,
                (SELECT COUNT(*) FROM prompt_executions) AS total_executions,
                (SELECT AVG(rating) FROM prompts WHERE rating IS NOT NULL) AS avg_rating,
                (SELECT COUNT(*) FROM prompt_executions WHERE created_at >= $1) AS recent_executions
            "#,
        )
        .bind(recent_since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute prompt stats: {:?}", e);
            AppError::Database(e)
        })?;

        let most_used_query = match most_used_by {
            MostUsedCategoryBy::Executions => MOST_USED_BY_EXECUTIONS,
            MostUsedCategoryBy::Prompts => MOST_USED_BY_PROMPTS,
        };
        let most_used_category: Option<String> = sqlx::query_scalar(most_used_query)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to rank categories: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(PromptStats {
            total_prompts: counts.total_prompts,
            active_prompts: counts.active_prompts,
            template_prompts: counts.template_prompts,
            total_executions: counts.total_executions,
            avg_rating: counts.avg_rating,
            most_used_category,
            recent_executions: counts.recent_executions,
        })
    }
}
