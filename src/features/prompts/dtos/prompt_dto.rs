use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::features::prompts::models::{NewPrompt, Prompt, PromptFilter};
use crate::shared::constants::{
    DEFAULT_PROMPT_VERSION, PROMPT_CONTENT_MAX, PROMPT_DESCRIPTION_MAX, PROMPT_TITLE_MAX,
    PROMPT_VERSION_MAX, RATING_MAX_DIGITS, RATING_SCALE,
};
use crate::shared::types::{
    default_page, default_page_size, double_option, JsonMap, PaginationQuery, SortDirection,
};
use crate::shared::validation::{
    check_decimal_precision, check_decimal_range, check_max_chars, check_not_empty,
    error_with_message, into_result,
};

fn default_version() -> String {
    DEFAULT_PROMPT_VERSION.to_string()
}

// Query params for listing prompts
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct PromptQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Search in title, description or content
    pub search: Option<String>,

    /// Filter by category
    pub category_id: Option<i64>,

    /// Filter by active status (true = active, false = inactive, none = all)
    pub is_active: Option<bool>,

    /// Filter by template flag
    pub is_template: Option<bool>,

    /// Only prompts carrying this tag
    pub tag: Option<String>,

    /// Sort direction (default: desc by created_at)
    #[serde(default)]
    pub sort: SortDirection,
}

impl Default for PromptQueryParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            search: None,
            category_id: None,
            is_active: None,
            is_template: None,
            tag: None,
            sort: SortDirection::default(),
        }
    }
}

impl PromptQueryParams {
    pub fn into_filter(self) -> PromptFilter {
        let pagination = PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        };
        PromptFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            category_id: self.category_id,
            is_active: self.is_active,
            is_template: self.is_template,
            tag: self.tag.filter(|t| !t.is_empty()),
            sort: self.sort,
            limit: pagination.limit(),
            offset: pagination.offset(),
        }
    }
}

// Create request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePromptDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,

    /// The prompt text itself
    #[validate(length(min = 1, max = 10000))]
    pub content: String,

    #[serde(default = "default_version")]
    #[validate(length(min = 1, max = 20))]
    pub version: String,

    #[serde(default)]
    pub is_template: bool,

    /// Variable name -> PromptVariableDefinition
    #[serde(default)]
    #[schema(value_type = Object)]
    pub variables: JsonMap,

    /// ModelSettings defaults for this prompt
    #[serde(default)]
    #[schema(value_type = Object)]
    pub settings: JsonMap,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub prompt_metadata: JsonMap,

    #[serde(default)]
    pub tags: Vec<String>,

    pub category_id: Option<i64>,
}

impl CreatePromptDto {
    pub fn into_new(self) -> NewPrompt {
        NewPrompt {
            title: self.title,
            description: self.description,
            content: self.content,
            version: self.version,
            is_template: self.is_template,
            variables: self.variables,
            settings: self.settings,
            prompt_metadata: self.prompt_metadata,
            tags: self.tags,
            category_id: self.category_id,
        }
    }
}

/// Partial update request.
///
/// Absent fields are left unchanged. `null` clears `rating` and
/// `category_id`, and resets `description` to empty.
/// `usage_count` and `last_used_at` are owned by execution recording.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePromptDto {
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    pub content: Option<String>,

    pub version: Option<String>,

    pub is_active: Option<bool>,

    pub is_template: Option<bool>,

    /// 0.00 - 5.00, at most two decimal places
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "4.50")]
    pub rating: Option<Option<Decimal>>,

    #[schema(value_type = Option<Object>)]
    pub variables: Option<JsonMap>,

    #[schema(value_type = Option<Object>)]
    pub settings: Option<JsonMap>,

    #[schema(value_type = Option<Object>)]
    pub prompt_metadata: Option<JsonMap>,

    pub tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub category_id: Option<Option<i64>>,
}

/// Validate a rating against NUMERIC(3, 2) and the 0.00 - 5.00 range
pub fn validate_rating(rating: &Decimal) -> Result<(), String> {
    check_decimal_precision(rating, RATING_SCALE, RATING_MAX_DIGITS)?;
    check_decimal_range(rating, Decimal::new(0, 2), Decimal::new(500, 2))
}

impl Validate for UpdatePromptDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(title) = &self.title {
            check_not_empty(&mut errors, "title", title);
            check_max_chars(&mut errors, "title", title, PROMPT_TITLE_MAX);
        }
        if let Some(Some(description)) = &self.description {
            check_max_chars(
                &mut errors,
                "description",
                description,
                PROMPT_DESCRIPTION_MAX,
            );
        }
        if let Some(content) = &self.content {
            check_not_empty(&mut errors, "content", content);
            check_max_chars(&mut errors, "content", content, PROMPT_CONTENT_MAX);
        }
        if let Some(version) = &self.version {
            check_not_empty(&mut errors, "version", version);
            check_max_chars(&mut errors, "version", version, PROMPT_VERSION_MAX);
        }
        if let Some(Some(rating)) = &self.rating {
            if let Err(message) = validate_rating(rating) {
                errors.add("rating", error_with_message("range", message));
            }
        }

        into_result(errors)
    }
}

impl UpdatePromptDto {
    /// Overwrite exactly the supplied fields
    pub fn apply(self, prompt: &mut Prompt) {
        if let Some(title) = self.title {
            prompt.title = title;
        }
        if let Some(description) = self.description {
            prompt.description = description.unwrap_or_default();
        }
        if let Some(content) = self.content {
            prompt.content = content;
        }
        if let Some(version) = self.version {
            prompt.version = version;
        }
        if let Some(is_active) = self.is_active {
            prompt.is_active = is_active;
        }
        if let Some(is_template) = self.is_template {
            prompt.is_template = is_template;
        }
        if let Some(rating) = self.rating {
            prompt.rating = rating.map(|mut r| {
                r.rescale(RATING_SCALE);
                r
            });
        }
        if let Some(variables) = self.variables {
            prompt.variables = variables;
        }
        if let Some(settings) = self.settings {
            prompt.settings = settings;
        }
        if let Some(prompt_metadata) = self.prompt_metadata {
            prompt.prompt_metadata = prompt_metadata;
        }
        if let Some(tags) = self.tags {
            prompt.tags = tags;
        }
        if let Some(category_id) = self.category_id {
            prompt.category_id = category_id;
        }
    }
}

// Response DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromptResponseDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub version: String,
    pub is_active: bool,
    pub is_template: bool,
    pub usage_count: i64,
    #[schema(value_type = Option<String>, example = "4.50")]
    pub rating: Option<Decimal>,
    #[schema(value_type = Object)]
    pub variables: JsonMap,
    #[schema(value_type = Object)]
    pub settings: JsonMap,
    #[schema(value_type = Object)]
    pub prompt_metadata: JsonMap,
    pub tags: Vec<String>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<Prompt> for PromptResponseDto {
    fn from(p: Prompt) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            content: p.content,
            version: p.version,
            is_active: p.is_active,
            is_template: p.is_template,
            usage_count: p.usage_count,
            rating: p.rating,
            variables: p.variables,
            settings: p.settings,
            prompt_metadata: p.prompt_metadata,
            tags: p.tags,
            category_id: p.category_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
            last_used_at: p.last_used_at,
        }
    }
}

/// Variable bindings for rendering a prompt
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenderPromptDto {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub input_data: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderedPromptDto {
    pub prompt_id: i64,
    pub rendered: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn prompt() -> Prompt {
        let now = Utc::now();
        Prompt {
            id: 7,
            title: "Ad copy".to_string(),
            description: "For campaigns".to_string(),
            content: "Write an ad for {{product}}".to_string(),
            version: "1.0.0".to_string(),
            is_active: true,
            is_template: true,
            usage_count: 3,
            rating: Some(Decimal::new(400, 2)),
            variables: JsonMap::new(),
            settings: JsonMap::new(),
            prompt_metadata: JsonMap::new(),
            tags: vec!["ads".to_string()],
            category_id: Some(1),
            created_at: now,
            updated_at: now,
            last_used_at: None,
        }
    }

    fn create(content: String) -> CreatePromptDto {
        serde_json::from_value(json!({"title": "t", "content": content})).unwrap()
    }

    #[test]
    fn test_create_fills_defaults() {
        let dto = create("hello".to_string());
        assert!(dto.validate().is_ok());

        let new = dto.into_new();
        assert_eq!(new.version, "1.0.0");
        assert_eq!(new.description, "");
        assert!(!new.is_template);
        assert!(new.variables.is_empty());
        assert!(new.tags.is_empty());
        assert_eq!(new.category_id, None);
    }

    #[test]
    fn test_create_content_boundary() {
        assert!(create("c".repeat(10000)).validate().is_ok());
        assert!(create("c".repeat(10001)).validate().is_err());
    }

    #[test]
    fn test_create_title_and_version_boundaries() {
        let mut dto = create("c".to_string());
        dto.title = "t".repeat(200);
        dto.version = "v".repeat(20);
        assert!(dto.validate().is_ok());

        dto.title = "t".repeat(201);
        assert!(dto.validate().is_err());

        dto.title = "t".to_string();
        dto.version = "v".repeat(21);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_description_boundary() {
        let mut dto = create("c".to_string());
        dto.description = "d".repeat(1000);
        assert!(dto.validate().is_ok());
        dto.description = "d".repeat(1001);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_requires_title_and_content() {
        let missing: Result<CreatePromptDto, _> = serde_json::from_value(json!({"title": "t"}));
        assert!(missing.is_err());
        let missing: Result<CreatePromptDto, _> = serde_json::from_value(json!({"content": "c"}));
        assert!(missing.is_err());
    }

    #[test]
    fn test_update_rating_boundaries() {
        let rating = |value: serde_json::Value| -> UpdatePromptDto {
            serde_json::from_value(json!({ "rating": value })).unwrap()
        };

        assert!(rating(json!("0.00")).validate().is_ok());
        assert!(rating(json!("5.00")).validate().is_ok());
        assert!(rating(json!(4.5)).validate().is_ok());
        assert!(rating(json!("5.01")).validate().is_err());
        assert!(rating(json!("-0.01")).validate().is_err());
        assert!(rating(json!("4.555")).validate().is_err());
        assert!(rating(json!(null)).validate().is_ok());
    }

    #[test]
    fn test_update_absent_fields_unchanged() {
        let original = prompt();
        let mut updated = original.clone();
        let dto: UpdatePromptDto = serde_json::from_value(json!({"title": "New"})).unwrap();
        dto.apply(&mut updated);

        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.rating, original.rating);
        assert_eq!(updated.category_id, original.category_id);
        assert_eq!(updated.tags, original.tags);
        assert_eq!(updated.usage_count, original.usage_count);
    }

    #[test]
    fn test_update_null_clears_nullable_fields() {
        let mut p = prompt();
        let dto: UpdatePromptDto = serde_json::from_value(json!({
            "rating": null,
            "category_id": null,
            "description": null
        }))
        .unwrap();
        dto.apply(&mut p);

        assert_eq!(p.rating, None);
        assert_eq!(p.category_id, None);
        assert_eq!(p.description, "");
        assert_eq!(p.title, "Ad copy");
    }

    #[test]
    fn test_update_rating_is_carried_with_scale_two() {
        let mut p = prompt();
        let dto: UpdatePromptDto = serde_json::from_value(json!({"rating": 4.5})).unwrap();
        dto.apply(&mut p);

        let rating = p.rating.unwrap();
        assert_eq!(rating, Decimal::from_str("4.50").unwrap());
        assert_eq!(rating.to_string(), "4.50");
    }

    #[test]
    fn test_query_params_into_filter() {
        let params = PromptQueryParams {
            page: 2,
            page_size: 20,
            search: Some("  ".to_string()),
            tag: Some("ads".to_string()),
            ..PromptQueryParams::default()
        };
        let filter = params.into_filter();

        assert_eq!(filter.limit, 20);
        assert_eq!(filter.offset, 20);
        assert_eq!(filter.search, None);
        assert_eq!(filter.tag.as_deref(), Some("ads"));
    }

    #[test]
    fn test_response_survives_json_round_trip() {
        let mut prompt = prompt();
        prompt.rating = Some(Decimal::from_str("4.50").unwrap());
        prompt.variables = json!({
            "product": {"type": "string", "required": true, "description": "What to sell"},
            "tone": {"type": "string", "default_value": "friendly"}
        })
        .as_object()
        .cloned()
        .unwrap();
        prompt.settings = json!({"temperature": 0.7, "max_tokens": 256, "stop": ["\n\n"]})
            .as_object()
            .cloned()
            .unwrap();
        prompt.prompt_metadata = json!({"owner": "growth", "nested": {"ids": [1, 2, 3], "ok": null}})
            .as_object()
            .cloned()
            .unwrap();
        prompt.tags = vec!["ads".to_string(), "spring campaign".to_string()];
        prompt.last_used_at = Some(prompt.created_at);

        let original = PromptResponseDto::from(prompt);
        let encoded = serde_json::to_string(&original).unwrap();
        let decoded: PromptResponseDto = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.rating.map(|r| r.scale()), Some(2));
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::to_value(&original).unwrap()
        );
    }
}
