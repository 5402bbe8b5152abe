mod postgres;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::categories::models::{NewPromptCategory, PromptCategory};

pub use postgres::PgCategoryRepository;

/// Change applied to a locked category row; an `Err` aborts the update
pub type CategoryEdit = Box<dyn FnOnce(&mut PromptCategory) -> Result<()> + Send>;

/// Storage operations for prompt categories.
///
/// Implementations enforce name uniqueness (`AppError::Conflict`) and, on
/// delete, detach prompts that referenced the category.
#[async_trait]
pub trait CategoryRepository: Send + Sync + 'static {
    async fn insert(&self, category: NewPromptCategory) -> Result<PromptCategory>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PromptCategory>>;

    /// All categories ordered by name
    async fn list(&self) -> Result<Vec<PromptCategory>>;

    /// Lock the row, apply `edit` and persist name, description and color;
    /// refreshes `updated_at`. Returns `None` when the category does not exist.
    async fn update(&self, id: i64, edit: CategoryEdit) -> Result<Option<PromptCategory>>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: i64) -> Result<bool>;
}
