use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryResponseDto, CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::models::PromptCategory;
use crate::features::categories::repositories::{CategoryEdit, CategoryRepository};
use crate::features::prompts::dtos::{PromptQueryParams, PromptResponseDto};
use crate::features::prompts::repositories::PromptRepository;

/// Service for category operations
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    prompts: Arc<dyn PromptRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>, prompts: Arc<dyn PromptRepository>) -> Self {
        Self {
            categories,
            prompts,
        }
    }

    async fn find(&self, id: i64) -> Result<PromptCategory> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    pub async fn create(&self, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        let category = self.categories.insert(dto.into_new()).await?;

        tracing::info!(
            "Category created: id={}, name={:?}",
            category.id,
            category.name
        );

        Ok(category.into())
    }

    /// List all categories ordered by name
    pub async fn list(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.categories.list().await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<CategoryResponseDto> {
        Ok(self.find(id).await?.into())
    }

    pub async fn update(&self, id: i64, dto: UpdateCategoryDto) -> Result<CategoryResponseDto> {
        if dto.is_empty() {
            return self.get_by_id(id).await;
        }

        let edit: CategoryEdit = Box::new(move |category: &mut PromptCategory| {
            dto.apply(category);
            Ok(())
        });

        let category = self
            .categories
            .update(id, edit)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))?;

        tracing::info!("Category updated: id={}", category.id);

        Ok(category.into())
    }

    /// Delete a category; its prompts become uncategorized
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.categories.delete(id).await? {
            return Err(AppError::NotFound(format!(
                "Category with id {} not found",
                id
            )));
        }

        tracing::info!("Category deleted: id={}", id);

        Ok(())
    }

    /// Prompts filed under a category, with the usual prompt list filters
    pub async fn list_prompts(
        &self,
        id: i64,
        mut params: PromptQueryParams,
    ) -> Result<(Vec<PromptResponseDto>, i64)> {
        self.find(id).await?;

        params.category_id = Some(id);
        let (prompts, total) = self.prompts.list(&params.into_filter()).await?;

        Ok((
            prompts.into_iter().map(PromptResponseDto::from).collect(),
            total,
        ))
    }
}
