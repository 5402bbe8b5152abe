use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::features::executions::models::{ExecutionStatus, NewExecution, PromptExecution};
use crate::shared::constants::{
    COST_MAX_DIGITS, COST_SCALE, ERROR_MESSAGE_MAX, USER_FEEDBACK_MAX,
};
use crate::shared::types::{
    default_page, default_page_size, double_option, JsonMap, PaginationQuery,
};
use crate::shared::validation::{
    check_decimal_precision, check_max_chars, error_with_message, into_result,
};

/// Record an execution of a prompt
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExecutionDto {
    pub prompt_id: i64,

    /// Variable bindings used for this run
    #[serde(default)]
    #[schema(value_type = Object)]
    pub input_data: JsonMap,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub model_name: String,

    /// ModelSettings actually used
    #[serde(default)]
    #[schema(value_type = Object)]
    pub model_settings: JsonMap,
}

impl CreateExecutionDto {
    pub fn into_new(self) -> NewExecution {
        NewExecution {
            prompt_id: self.prompt_id,
            input_data: self.input_data,
            model_name: self.model_name,
            model_settings: self.model_settings,
        }
    }
}

/// Attach results, timing, cost or feedback to an execution.
///
/// Absent fields are left unchanged and `null` clears a nullable field.
/// `output_data: null` resets it to an empty object.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateExecutionDto {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Object>)]
    pub output_data: Option<Option<JsonMap>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub execution_time_ms: Option<Option<i64>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub token_count: Option<Option<i64>>,

    /// At most 6 decimal places and 10 digits
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "0.001250")]
    pub cost: Option<Option<Decimal>>,

    pub status: Option<ExecutionStatus>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub error_message: Option<Option<String>>,

    /// 1 - 5
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub user_rating: Option<Option<i32>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub user_feedback: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

fn non_negative() -> ValidationError {
    error_with_message("range", "must not be negative".to_string())
}

impl Validate for UpdateExecutionDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(Some(ms)) = self.execution_time_ms {
            if ms < 0 {
                errors.add("execution_time_ms", non_negative());
            }
        }
        if let Some(Some(tokens)) = self.token_count {
            if tokens < 0 {
                errors.add("token_count", non_negative());
            }
        }
        if let Some(Some(cost)) = &self.cost {
            if *cost < Decimal::ZERO {
                errors.add("cost", non_negative());
            }
            if let Err(message) = check_decimal_precision(cost, COST_SCALE, COST_MAX_DIGITS) {
                errors.add("cost", error_with_message("precision", message));
            }
        }
        if let Some(Some(message)) = &self.error_message {
            check_max_chars(&mut errors, "error_message", message, ERROR_MESSAGE_MAX);
        }
        if let Some(Some(rating)) = self.user_rating {
            if !(1..=5).contains(&rating) {
                errors.add(
                    "user_rating",
                    error_with_message("range", "must be between 1 and 5".to_string()),
                );
            }
        }
        if let Some(Some(feedback)) = &self.user_feedback {
            check_max_chars(&mut errors, "user_feedback", feedback, USER_FEEDBACK_MAX);
        }

        into_result(errors)
    }
}

impl UpdateExecutionDto {
    /// Overwrite exactly the supplied fields
    pub fn apply(self, execution: &mut PromptExecution) {
        if let Some(output_data) = self.output_data {
            execution.output_data = output_data.unwrap_or_default();
        }
        if let Some(ms) = self.execution_time_ms {
            execution.execution_time_ms = ms;
        }
        if let Some(tokens) = self.token_count {
            execution.token_count = tokens;
        }
        if let Some(cost) = self.cost {
            execution.cost = cost.map(|mut c| {
                c.rescale(COST_SCALE);
                c
            });
        }
        if let Some(status) = self.status {
            execution.status = status;
        }
        if let Some(message) = self.error_message {
            execution.error_message = message;
        }
        if let Some(rating) = self.user_rating {
            execution.user_rating = rating;
        }
        if let Some(feedback) = self.user_feedback {
            execution.user_feedback = feedback;
        }
        if let Some(completed_at) = self.completed_at {
            execution.completed_at = completed_at;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExecutionResponseDto {
    pub id: i64,
    pub prompt_id: i64,
    #[schema(value_type = Object)]
    pub input_data: JsonMap,
    #[schema(value_type = Object)]
    pub output_data: JsonMap,
    pub model_name: String,
    #[schema(value_type = Object)]
    pub model_settings: JsonMap,
    pub execution_time_ms: Option<i64>,
    pub token_count: Option<i64>,
    #[schema(value_type = Option<String>, example = "0.001250")]
    pub cost: Option<Decimal>,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub user_rating: Option<i32>,
    pub user_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<PromptExecution> for ExecutionResponseDto {
    fn from(e: PromptExecution) -> Self {
        Self {
            id: e.id,
            prompt_id: e.prompt_id,
            input_data: e.input_data,
            output_data: e.output_data,
            model_name: e.model_name,
            model_settings: e.model_settings,
            execution_time_ms: e.execution_time_ms,
            token_count: e.token_count,
            cost: e.cost,
            status: e.status,
            error_message: e.error_message,
            user_rating: e.user_rating,
            user_feedback: e.user_feedback,
            created_at: e.created_at,
            completed_at: e.completed_at,
        }
    }
}

/// Query params for a prompt's execution history, newest first
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ExecutionQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Only executions with this status
    pub status: Option<ExecutionStatus>,
}

impl Default for ExecutionQueryParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            status: None,
        }
    }
}

impl ExecutionQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}
