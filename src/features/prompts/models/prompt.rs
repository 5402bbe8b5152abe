use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::types::{JsonMap, SortDirection};

/// Stored prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// The prompt text itself
    pub content: String,
    pub version: String,
    pub is_active: bool,
    /// Whether `content` contains `{{variable}}` placeholders
    pub is_template: bool,
    /// Bumped by execution recording only
    pub usage_count: i64,
    /// NUMERIC(3, 2), always carried with scale 2
    pub rating: Option<Decimal>,
    pub variables: JsonMap,
    pub settings: JsonMap,
    pub prompt_metadata: JsonMap,
    pub tags: Vec<String>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Data for inserting a new prompt; id, counters and timestamps are assigned by storage
#[derive(Debug, Clone)]
pub struct NewPrompt {
    pub title: String,
    pub description: String,
    pub content: String,
    pub version: String,
    pub is_template: bool,
    pub variables: JsonMap,
    pub settings: JsonMap,
    pub prompt_metadata: JsonMap,
    pub tags: Vec<String>,
    pub category_id: Option<i64>,
}

/// Query-side filter for listing prompts
#[derive(Debug, Clone, Default)]
pub struct PromptFilter {
    /// Case-insensitive substring of title, description or content
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub is_active: Option<bool>,
    pub is_template: Option<bool>,
    /// Prompt must carry this tag
    pub tag: Option<String>,
    pub sort: SortDirection,
    pub limit: i64,
    pub offset: i64,
}
