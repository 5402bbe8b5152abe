use async_trait::async_trait;
use sqlx::PgPool;

use super::{CategoryEdit, CategoryRepository};
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::categories::models::{NewPromptCategory, PromptCategory};

const CATEGORY_COLUMNS: &str = "id, name, description, color, created_at, updated_at";

/// PostgreSQL-backed category storage
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn insert(&self, category: NewPromptCategory) -> Result<PromptCategory> {
        let query = format!(
            r#"
            INSERT INTO prompt_categories (name, description, color)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, PromptCategory>(&query)
            .bind(&category.name)
            .bind(&category.description)
            .bind(&category.color)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "category"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PromptCategory>> {
        let query = format!(
            "SELECT {} FROM prompt_categories WHERE id = $1",
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, PromptCategory>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn list(&self) -> Result<Vec<PromptCategory>> {
        let query = format!(
            "SELECT {} FROM prompt_categories ORDER BY name",
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, PromptCategory>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update(&self, id: i64, edit: CategoryEdit) -> Result<Option<PromptCategory>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to open transaction: {:?}", e);
            AppError::Database(e)
        })?;

        let query = format!(
            "SELECT {} FROM prompt_categories WHERE id = $1 FOR UPDATE",
            CATEGORY_COLUMNS
        );
        let category = sqlx::query_as::<_, PromptCategory>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock category {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        let Some(mut category) = category else {
            return Ok(None);
        };
        edit(&mut category)?;

        let query = format!(
            r#"
            UPDATE prompt_categories
            SET name = $1, description = $2, color = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        let category = sqlx::query_as::<_, PromptCategory>(&query)
            .bind(&category.name)
            .bind(&category.description)
            .bind(&category.color)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| handle_db_error(e, "category"))?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit category update: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(Some(category))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // prompts.category_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM prompt_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete category {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
