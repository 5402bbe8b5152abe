mod postgres;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::executions::models::{ExecutionStatus, NewExecution, PromptExecution};

pub use postgres::PgExecutionRepository;

/// Change applied to a locked execution row; an `Err` aborts the update
pub type ExecutionEdit = Box<dyn FnOnce(&mut PromptExecution) -> Result<()> + Send>;

/// Storage operations for execution records
#[async_trait]
pub trait ExecutionRepository: Send + Sync + 'static {
    /// Insert the execution and, atomically with it, bump the prompt's
    /// `usage_count` and set its `last_used_at`.
    ///
    /// An unknown `prompt_id` is `AppError::InvalidReference`; nothing is written.
    async fn record(&self, execution: NewExecution) -> Result<PromptExecution>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PromptExecution>>;

    /// Executions of one prompt, newest first, plus the total match count
    async fn list_for_prompt(
        &self,
        prompt_id: i64,
        status: Option<ExecutionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PromptExecution>, i64)>;

    /// Lock the row, apply `edit` and persist the mutable result fields.
    /// `prompt_id`, `input_data`, `model_name`, `model_settings` and
    /// `created_at` are never written here.
    async fn update(&self, id: i64, edit: ExecutionEdit) -> Result<Option<PromptExecution>>;
}
