mod postgres;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::prompts::models::{NewPrompt, Prompt, PromptFilter};

pub use postgres::PgPromptRepository;

/// Change applied to a locked prompt row; an `Err` aborts the update
pub type PromptEdit = Box<dyn FnOnce(&mut Prompt) -> Result<()> + Send>;

/// Storage operations for prompts.
///
/// A `category_id` that names no category is rejected with
/// `AppError::InvalidReference` and nothing is written.
#[async_trait]
pub trait PromptRepository: Send + Sync + 'static {
    async fn insert(&self, prompt: NewPrompt) -> Result<Prompt>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Prompt>>;

    /// One page of prompts matching `filter`, plus the total match count
    async fn list(&self, filter: &PromptFilter) -> Result<(Vec<Prompt>, i64)>;

    /// Lock the row, apply `edit` and persist the editable fields in one
    /// step; refreshes `updated_at`. `usage_count` and `last_used_at` are
    /// never written here. Returns `None` when the prompt does not exist.
    async fn update(&self, id: i64, edit: PromptEdit) -> Result<Option<Prompt>>;

    /// Soft delete: sets `is_active = false`
    async fn deactivate(&self, id: i64) -> Result<Option<Prompt>>;

    /// Hard delete, removing the prompt's executions with it
    async fn delete(&self, id: i64) -> Result<bool>;
}
