use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::core::error::Result;
use crate::features::stats::dtos::{MostUsedCategoryBy, PromptStatsDto, StatsQuery};
use crate::features::stats::repositories::StatsRepository;
use crate::shared::constants::RECENT_EXECUTIONS_WINDOW_DAYS;

pub struct StatsService {
    stats: Arc<dyn StatsRepository>,
    default_most_used_by: MostUsedCategoryBy,
}

impl StatsService {
    pub fn new(stats: Arc<dyn StatsRepository>, default_most_used_by: MostUsedCategoryBy) -> Self {
        Self {
            stats,
            default_most_used_by,
        }
    }

    pub async fn prompt_stats(&self, query: StatsQuery) -> Result<PromptStatsDto> {
        let most_used_by = query.most_used_by.unwrap_or(self.default_most_used_by);
        let recent_since = Utc::now() - Duration::days(RECENT_EXECUTIONS_WINDOW_DAYS);

        let stats = self.stats.prompt_stats(most_used_by, recent_since).await?;
        Ok(stats.into())
    }
}
