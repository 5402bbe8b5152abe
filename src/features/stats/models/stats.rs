use rust_decimal::Decimal;

/// Aggregates over the whole prompt library, computed on demand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptStats {
    pub total_prompts: i64,
    pub active_prompts: i64,
    pub template_prompts: i64,
    pub total_executions: i64,
    /// Unrounded mean over prompts with a rating
    pub avg_rating: Option<Decimal>,
    pub most_used_category: Option<String>,
    pub recent_executions: i64,
}
