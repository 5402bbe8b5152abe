//! Structural schemas for the JSON columns of prompts and executions.
//!
//! Storage keeps `variables`, `settings` and `model_settings` as opaque JSON;
//! the services parse them through these shapes before writing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::shared::constants::VARIABLE_NAME_MAX;
use crate::shared::types::JsonMap;
use crate::shared::validation::describe_errors;

/// Value type a template variable accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl VariableType {
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            VariableType::String => value.is_string(),
            VariableType::Number => value.is_number(),
            VariableType::Boolean => value.is_boolean(),
            VariableType::Array => value.is_array(),
            VariableType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::String => write!(f, "string"),
            VariableType::Number => write!(f, "number"),
            VariableType::Boolean => write!(f, "boolean"),
            VariableType::Array => write!(f, "array"),
            VariableType::Object => write!(f, "object"),
        }
    }
}

/// Declaration of one template variable slot, stored under its name in `Prompt.variables`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PromptVariableDefinition {
    /// Defaults to the key the definition is stored under
    #[serde(default)]
    #[validate(length(max = 100))]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: VariableType,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,

    #[serde(default)]
    pub default_value: Option<serde_json::Value>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub validation_rules: JsonMap,
}

/// Generation parameters for a model invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ModelSettings {
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f64>,

    #[validate(range(min = 1))]
    pub max_tokens: Option<i64>,

    #[validate(range(min = 0.0, max = 1.0))]
    pub top_p: Option<f64>,

    #[validate(range(min = -2.0, max = 2.0))]
    pub frequency_penalty: Option<f64>,

    #[validate(range(min = -2.0, max = 2.0))]
    pub presence_penalty: Option<f64>,

    #[serde(default)]
    pub stop_sequences: Vec<String>,

    #[validate(length(max = 2000))]
    pub system_message: Option<String>,
}

fn prefixed(field: &str, errors: &validator::ValidationErrors) -> AppError {
    AppError::Validation(
        describe_errors(errors)
            .into_iter()
            .map(|line| format!("{}.{}", field, line))
            .collect(),
    )
}

/// Parse and range-check a settings object. Unknown keys are allowed.
pub fn parse_model_settings(field: &str, map: &JsonMap) -> Result<ModelSettings> {
    let settings: ModelSettings = serde_json::from_value(serde_json::Value::Object(map.clone()))
        .map_err(|e| AppError::invalid(field, e))?;
    settings.validate().map_err(|e| prefixed(field, &e))?;
    Ok(settings)
}

/// Parse every entry of a `variables` object as a [`PromptVariableDefinition`].
///
/// A definition's `name` must be empty or equal to its key, and a
/// `default_value` must match the declared type.
pub fn parse_variable_definitions(
    map: &JsonMap,
) -> Result<BTreeMap<String, PromptVariableDefinition>> {
    let mut definitions = BTreeMap::new();
    let mut problems = Vec::new();

    for (key, value) in map {
        let field = format!("variables.{}", key);
        let mut definition: PromptVariableDefinition =
            match serde_json::from_value(value.clone()) {
                Ok(definition) => definition,
                Err(e) => {
                    problems.push(format!("{}: {}", field, e));
                    continue;
                }
            };

        if key.chars().count() as u64 > VARIABLE_NAME_MAX {
            problems.push(format!(
                "{}: name must be at most {} characters",
                field, VARIABLE_NAME_MAX
            ));
        }
        if definition.name.is_empty() {
            definition.name = key.clone();
        } else if definition.name != *key {
            problems.push(format!("{}.name: must match the variable key", field));
        }
        if let Err(e) = definition.validate() {
            problems.extend(
                describe_errors(&e)
                    .into_iter()
                    .map(|line| format!("{}.{}", field, line)),
            );
        }
        if let Some(default) = &definition.default_value {
            if !default.is_null() && !definition.kind.accepts(default) {
                problems.push(format!(
                    "{}.default_value: must be of type {}",
                    field, definition.kind
                ));
            }
        }

        definitions.insert(key.clone(), definition);
    }

    if problems.is_empty() {
        Ok(definitions)
    } else {
        Err(AppError::Validation(problems))
    }
}
