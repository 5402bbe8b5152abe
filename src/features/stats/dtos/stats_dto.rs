use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::stats::models::PromptStats;
use crate::shared::constants::RATING_SCALE;

/// How `most_used_category` is ranked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MostUsedCategoryBy {
    /// Executions recorded against the category's prompts
    #[default]
    Executions,
    /// Prompts filed under the category
    Prompts,
}

impl FromStr for MostUsedCategoryBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "executions" => Ok(MostUsedCategoryBy::Executions),
            "prompts" => Ok(MostUsedCategoryBy::Prompts),
            other => Err(format!(
                "Invalid most-used-category ranking '{}': expected 'executions' or 'prompts'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Override the configured ranking for `most_used_category`
    pub most_used_by: Option<MostUsedCategoryBy>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromptStatsDto {
    pub total_prompts: i64,
    pub active_prompts: i64,
    pub template_prompts: i64,
    pub total_executions: i64,
    /// Mean rating over rated prompts, two decimal places
    #[schema(value_type = Option<String>, example = "4.25")]
    pub avg_rating: Option<Decimal>,
    pub most_used_category: Option<String>,
    /// Executions created in the last 7 days
    pub recent_executions: i64,
}

impl From<PromptStats> for PromptStatsDto {
    fn from(s: PromptStats) -> Self {
        Self {
            total_prompts: s.total_prompts,
            active_prompts: s.active_prompts,
            template_prompts: s.template_prompts,
            total_executions: s.total_executions,
            avg_rating: s.avg_rating.map(|avg| {
                let mut rounded =
                    avg.round_dp_with_strategy(RATING_SCALE, RoundingStrategy::MidpointAwayFromZero);
                rounded.rescale(RATING_SCALE);
                rounded
            }),
            most_used_category: s.most_used_category,
            recent_executions: s.recent_executions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_parses_case_insensitively() {
        assert_eq!(
            "Prompts".parse::<MostUsedCategoryBy>(),
            Ok(MostUsedCategoryBy::Prompts)
        );
        assert_eq!(
            " executions ".parse::<MostUsedCategoryBy>(),
            Ok(MostUsedCategoryBy::Executions)
        );
        assert!("usage".parse::<MostUsedCategoryBy>().is_err());
    }

    #[test]
    fn test_avg_rating_rounded_to_two_places() {
        let stats = PromptStats {
            avg_rating: Some(Decimal::from_str("4.3333333333").unwrap()),
            ..PromptStats::default()
        };
        let dto = PromptStatsDto::from(stats);
        assert_eq!(dto.avg_rating.unwrap().to_string(), "4.33");

        let stats = PromptStats {
            avg_rating: Some(Decimal::from_str("4.125").unwrap()),
            ..PromptStats::default()
        };
        assert_eq!(
            PromptStatsDto::from(stats).avg_rating.unwrap().to_string(),
            "4.13"
        );

        let stats = PromptStats {
            avg_rating: Some(Decimal::from(4)),
            ..PromptStats::default()
        };
        assert_eq!(
            PromptStatsDto::from(stats).avg_rating.unwrap().to_string(),
            "4.00"
        );
    }
}
