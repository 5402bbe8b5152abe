pub mod stats_dto;

pub use stats_dto::{MostUsedCategoryBy, PromptStatsDto, StatsQuery};
