use utoipa::{Modify, OpenApi};

use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::executions::{
    dtos as executions_dtos, handlers as executions_handlers, models as executions_models,
};
use crate::features::prompts::{dtos as prompts_dtos, handlers as prompts_handlers};
use crate::features::stats::{dtos as stats_dtos, handlers as stats_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::create_category,
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        categories_handlers::list_category_prompts,
        // Prompts
        prompts_handlers::create_prompt,
        prompts_handlers::list_prompts,
        prompts_handlers::get_prompt,
        prompts_handlers::update_prompt,
        prompts_handlers::delete_prompt,
        prompts_handlers::render_prompt,
        // Executions
        executions_handlers::record_execution,
        executions_handlers::get_execution,
        executions_handlers::update_execution,
        executions_handlers::list_prompt_executions,
        // Stats
        stats_handlers::get_prompt_stats,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Categories
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::CategoryResponseDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            // Prompts
            prompts_dtos::VariableType,
            prompts_dtos::PromptVariableDefinition,
            prompts_dtos::ModelSettings,
            prompts_dtos::CreatePromptDto,
            prompts_dtos::UpdatePromptDto,
            prompts_dtos::PromptResponseDto,
            prompts_dtos::RenderPromptDto,
            prompts_dtos::RenderedPromptDto,
            ApiResponse<prompts_dtos::PromptResponseDto>,
            ApiResponse<Vec<prompts_dtos::PromptResponseDto>>,
            ApiResponse<prompts_dtos::RenderedPromptDto>,
            // Executions
            executions_models::ExecutionStatus,
            executions_dtos::CreateExecutionDto,
            executions_dtos::UpdateExecutionDto,
            executions_dtos::ExecutionResponseDto,
            ApiResponse<executions_dtos::ExecutionResponseDto>,
            ApiResponse<Vec<executions_dtos::ExecutionResponseDto>>,
            // Stats
            stats_dtos::MostUsedCategoryBy,
            stats_dtos::PromptStatsDto,
            ApiResponse<stats_dtos::PromptStatsDto>,
        )
    ),
    tags(
        (name = "categories", description = "Prompt categories"),
        (name = "prompts", description = "Prompt library, templates and rendering"),
        (name = "executions", description = "Execution history and feedback"),
        (name = "stats", description = "Aggregate statistics over the prompt library"),
    ),
    info(
        title = "Prompt Manager API",
        version = "0.1.0",
        description = "Prompt categories, prompts and execution history",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for path in [
            "/api/categories",
            "/api/categories/{id}",
            "/api/categories/{id}/prompts",
            "/api/prompts",
            "/api/prompts/{id}",
            "/api/prompts/{id}/render",
            "/api/prompts/{id}/executions",
            "/api/executions",
            "/api/executions/{id}",
            "/api/stats",
        ] {
            assert!(paths.contains(&path), "{} missing from OpenAPI doc", path);
        }
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Prompts".to_string(),
            version: "9.9.9".to_string(),
            description: "custom".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Prompts");
        assert_eq!(doc.info.version, "9.9.9");
        assert_eq!(doc.info.description.as_deref(), Some("custom"));
    }
}
