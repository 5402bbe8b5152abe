use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::features::categories::models::{NewPromptCategory, PromptCategory};
use crate::shared::constants::{
    CATEGORY_DESCRIPTION_MAX, CATEGORY_NAME_MAX, DEFAULT_CATEGORY_COLOR,
};
use crate::shared::types::double_option;
use crate::shared::validation::{
    check_hex_color, check_max_chars, check_not_empty, into_result, HEX_COLOR_REGEX,
};

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

/// Create request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,

    /// Hex color code, e.g. `#3B82F6`
    #[serde(default = "default_color")]
    #[validate(regex(
        path = *HEX_COLOR_REGEX,
        message = "must be a 7-character hex color code like #3B82F6"
    ))]
    pub color: String,
}

impl CreateCategoryDto {
    pub fn into_new(self) -> NewPromptCategory {
        NewPromptCategory {
            name: self.name,
            description: self.description,
            color: self.color,
        }
    }
}

/// Partial update request.
///
/// Absent fields are left unchanged. `null` resets `description` to empty
/// and `color` to the default color.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCategoryDto {
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub color: Option<Option<String>>,
}

impl Validate for UpdateCategoryDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = &self.name {
            check_not_empty(&mut errors, "name", name);
            check_max_chars(&mut errors, "name", name, CATEGORY_NAME_MAX);
        }
        if let Some(Some(description)) = &self.description {
            check_max_chars(
                &mut errors,
                "description",
                description,
                CATEGORY_DESCRIPTION_MAX,
            );
        }
        if let Some(Some(color)) = &self.color {
            check_hex_color(&mut errors, "color", color);
        }

        into_result(errors)
    }
}

impl UpdateCategoryDto {
    /// Overwrite exactly the supplied fields
    pub fn apply(self, category: &mut PromptCategory) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(description) = self.description {
            category.description = description.unwrap_or_default();
        }
        if let Some(color) = self.color {
            category.color = color.unwrap_or_else(default_color);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.color.is_none()
    }
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromptCategory> for CategoryResponseDto {
    fn from(c: PromptCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            color: c.color,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category() -> PromptCategory {
        let now = Utc::now();
        PromptCategory {
            id: 1,
            name: "Marketing".to_string(),
            description: "Ads".to_string(),
            color: "#FF0000".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let dto: CreateCategoryDto = serde_json::from_str(r#"{"name": "Marketing"}"#).unwrap();
        assert!(dto.validate().is_ok());

        let new = dto.into_new();
        assert_eq!(new.description, "");
        assert_eq!(new.color, "#3B82F6");
    }

    #[test]
    fn test_create_name_boundary() {
        let ok = CreateCategoryDto {
            name: "n".repeat(100),
            description: String::new(),
            color: default_color(),
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateCategoryDto {
            name: "n".repeat(101),
            ..ok.clone()
        };
        assert!(too_long.validate().is_err());

        let empty = CreateCategoryDto {
            name: String::new(),
            ..ok
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_create_description_boundary() {
        let base = CreateCategoryDto {
            name: "Ops".to_string(),
            description: "d".repeat(500),
            color: default_color(),
        };
        assert!(base.validate().is_ok());

        let too_long = CreateCategoryDto {
            description: "d".repeat(501),
            ..base
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_create_rejects_bad_color() {
        for color in ["red", "#FFF", "#3B82F6F", "3B82F6A"] {
            let dto = CreateCategoryDto {
                name: "Ops".to_string(),
                description: String::new(),
                color: color.to_string(),
            };
            assert!(dto.validate().is_err(), "color {} should be rejected", color);
        }
    }

    #[test]
    fn test_update_leaves_absent_fields_unchanged() {
        let mut c = category();
        let dto: UpdateCategoryDto = serde_json::from_str(r#"{"name": "Sales"}"#).unwrap();
        assert!(dto.validate().is_ok());
        dto.apply(&mut c);

        assert_eq!(c.name, "Sales");
        assert_eq!(c.description, "Ads");
        assert_eq!(c.color, "#FF0000");
    }

    #[test]
    fn test_update_null_resets_to_defaults() {
        let mut c = category();
        let dto: UpdateCategoryDto =
            serde_json::from_str(r#"{"description": null, "color": null}"#).unwrap();
        dto.apply(&mut c);

        assert_eq!(c.name, "Marketing");
        assert_eq!(c.description, "");
        assert_eq!(c.color, "#3B82F6");
    }

    #[test]
    fn test_update_validates_supplied_fields_only() {
        let dto: UpdateCategoryDto = serde_json::from_str(r##"{"color": "#12345"}"##).unwrap();
        assert!(dto.validate().is_err());

        let dto: UpdateCategoryDto = serde_json::from_str(r#"{"color": null}"#).unwrap();
        assert!(dto.validate().is_ok());

        assert!(UpdateCategoryDto::default().is_empty());
    }
}
