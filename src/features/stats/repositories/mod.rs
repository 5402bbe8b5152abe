mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::error::Result;
use crate::features::stats::dtos::MostUsedCategoryBy;
use crate::features::stats::models::PromptStats;

pub use postgres::PgStatsRepository;

/// Read-only aggregates over prompts and executions
#[async_trait]
pub trait StatsRepository: Send + Sync + 'static {
    /// `recent_since` bounds `recent_executions`. `most_used_category` is the
    /// highest count under `most_used_by`, ties broken by name ascending,
    /// and `None` when every category counts zero.
    async fn prompt_stats(
        &self,
        most_used_by: MostUsedCategoryBy,
        recent_since: DateTime<Utc>,
    ) -> Result<PromptStats>;
}
