use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for prompt category
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PromptCategory {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a new category; id and timestamps are assigned by storage
#[derive(Debug, Clone)]
pub struct NewPromptCategory {
    pub name: String,
    pub description: String,
    pub color: String,
}
