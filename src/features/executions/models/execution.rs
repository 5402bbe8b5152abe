use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::types::JsonMap;

/// Outcome of an execution, stored as lowercase text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    #[default]
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
            ExecutionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            "cancelled" => Ok(ExecutionStatus::Cancelled),
            other => Err(format!("unknown execution status '{}'", other)),
        }
    }
}

/// One recorded invocation of a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptExecution {
    pub id: i64,
    pub prompt_id: i64,
    /// Variable bindings used
    pub input_data: JsonMap,
    pub output_data: JsonMap,
    pub model_name: String,
    /// Settings actually used, not the prompt's defaults
    pub model_settings: JsonMap,
    pub execution_time_ms: Option<i64>,
    pub token_count: Option<i64>,
    /// NUMERIC(10, 6)
    pub cost: Option<Decimal>,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub user_rating: Option<i32>,
    pub user_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Client-supplied part of a new execution; status starts as `completed`
#[derive(Debug, Clone)]
pub struct NewExecution {
    pub prompt_id: i64,
    pub input_data: JsonMap,
    pub model_name: String,
    pub model_settings: JsonMap,
}
