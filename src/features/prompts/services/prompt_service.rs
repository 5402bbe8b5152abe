use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::prompts::dtos::{
    parse_model_settings, parse_variable_definitions, CreatePromptDto, PromptQueryParams,
    PromptResponseDto, RenderPromptDto, RenderedPromptDto, UpdatePromptDto,
};
use crate::features::prompts::models::Prompt;
use crate::features::prompts::repositories::{PromptEdit, PromptRepository};
use crate::shared::prompts::{render_content, validate_template, TemplateError};
use crate::shared::types::JsonMap;

/// Validate that a template can be compiled by minijinja
fn validate_template_compilation(content: &str) -> Result<()> {
    validate_template(content).map_err(|e| AppError::invalid("content", e))
}

/// Check the JSON columns that carry a known shape
fn validate_structured_fields(variables: &JsonMap, settings: &JsonMap) -> Result<()> {
    parse_variable_definitions(variables)?;
    parse_model_settings("settings", settings)?;
    Ok(())
}

/// Merge `input` over the declared defaults of `prompt.variables`.
///
/// Fails when a required variable is neither supplied (non-null) nor defaulted.
pub fn bind_variables(prompt: &Prompt, input: &JsonMap) -> Result<JsonMap> {
    let definitions = parse_variable_definitions(&prompt.variables)?;

    let mut bound = JsonMap::new();
    for (name, definition) in &definitions {
        if let Some(default) = definition.default_value.as_ref().filter(|v| !v.is_null()) {
            bound.insert(name.clone(), default.clone());
        }
    }
    for (name, value) in input {
        if !value.is_null() {
            bound.insert(name.clone(), value.clone());
        }
    }

    let missing: Vec<String> = definitions
        .iter()
        .filter(|(name, definition)| definition.required && !bound.contains_key(*name))
        .map(|(name, _)| format!("input_data.{}: required variable is missing", name))
        .collect();

    if missing.is_empty() {
        Ok(bound)
    } else {
        Err(AppError::Validation(missing))
    }
}

pub struct PromptService {
    prompts: Arc<dyn PromptRepository>,
}

impl std::fmt::Debug for PromptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptService")
            .field("prompts", &"<PromptRepository>")
            .finish()
    }
}

impl PromptService {
    pub fn new(prompts: Arc<dyn PromptRepository>) -> Self {
        Self { prompts }
    }

    async fn find(&self, id: i64) -> Result<Prompt> {
        self.prompts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", id)))
    }

    /// Create a new prompt
    pub async fn create(&self, dto: CreatePromptDto) -> Result<PromptResponseDto> {
        validate_structured_fields(&dto.variables, &dto.settings)?;
        if dto.is_template {
            validate_template_compilation(&dto.content)?;
        }

        let prompt = self.prompts.insert(dto.into_new()).await?;

        tracing::info!(
            "Prompt created: id={}, title={:?}, category_id={:?}",
            prompt.id,
            prompt.title,
            prompt.category_id
        );

        Ok(PromptResponseDto::from(prompt))
    }

    /// Get prompt by ID
    pub async fn get_by_id(&self, id: i64) -> Result<PromptResponseDto> {
        Ok(PromptResponseDto::from(self.find(id).await?))
    }

    /// List prompts with pagination and filters
    pub async fn list(&self, params: PromptQueryParams) -> Result<(Vec<PromptResponseDto>, i64)> {
        let filter = params.into_filter();
        let (prompts, total) = self.prompts.list(&filter).await?;

        Ok((
            prompts.into_iter().map(PromptResponseDto::from).collect(),
            total,
        ))
    }

    /// Apply a partial update. The result is re-validated as a whole, so
    /// flipping `is_template` on checks the existing content too.
    pub async fn update(&self, id: i64, dto: UpdatePromptDto) -> Result<PromptResponseDto> {
        let edit: PromptEdit = Box::new(move |prompt: &mut Prompt| {
            dto.apply(prompt);

            validate_structured_fields(&prompt.variables, &prompt.settings)?;
            if prompt.is_template {
                validate_template_compilation(&prompt.content)?;
            }
            Ok(())
        });

        let prompt = self
            .prompts
            .update(id, edit)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", id)))?;

        tracing::info!("Prompt updated: id={}", prompt.id);

        Ok(PromptResponseDto::from(prompt))
    }

    /// Soft delete by default; `permanent` removes the row and its executions
    pub async fn delete(&self, id: i64, permanent: bool) -> Result<()> {
        let found = if permanent {
            self.prompts.delete(id).await?
        } else {
            self.prompts.deactivate(id).await?.is_some()
        };

        if !found {
            return Err(AppError::NotFound(format!(
                "Prompt with id {} not found",
                id
            )));
        }

        tracing::info!("Prompt deleted: id={}, permanent={}", id, permanent);

        Ok(())
    }

    /// Render the prompt content with the given bindings
    pub async fn render(&self, id: i64, dto: RenderPromptDto) -> Result<RenderedPromptDto> {
        let prompt = self.find(id).await?;

        if !prompt.is_template {
            return Ok(RenderedPromptDto {
                prompt_id: prompt.id,
                rendered: prompt.content,
            });
        }

        let ctx = bind_variables(&prompt, &dto.input_data)?;
        let rendered = render_content(&prompt.content, &ctx).map_err(|e| match e {
            TemplateError::Syntax(_) => AppError::invalid("content", e),
            TemplateError::RenderError(_) => AppError::invalid("input_data", e),
        })?;

        Ok(RenderedPromptDto {
            prompt_id: prompt.id,
            rendered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::prompts::models::{NewPrompt, PromptFilter};
    use crate::modules::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Prompt storage that is slow to answer, so concurrent requests overlap
    struct SlowPrompts(Arc<MemoryStore>);

    impl SlowPrompts {
        fn inner(&self) -> &dyn PromptRepository {
            self.0.as_ref()
        }
    }

    #[async_trait]
    impl PromptRepository for SlowPrompts {
        async fn insert(&self, prompt: NewPrompt) -> Result<Prompt> {
            self.inner().insert(prompt).await
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Prompt>> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.inner().find_by_id(id).await
        }

        async fn list(&self, filter: &PromptFilter) -> Result<(Vec<Prompt>, i64)> {
            self.inner().list(filter).await
        }

        async fn update(&self, id: i64, edit: PromptEdit) -> Result<Option<Prompt>> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.inner().update(id, edit).await
        }

        async fn deactivate(&self, id: i64) -> Result<Option<Prompt>> {
            self.inner().deactivate(id).await
        }

        async fn delete(&self, id: i64) -> Result<bool> {
            self.inner().delete(id).await
        }
    }

    fn service() -> PromptService {
        PromptService::new(Arc::new(MemoryStore::new()))
    }

    fn create_dto(value: serde_json::Value) -> CreatePromptDto {
        serde_json::from_value(value).unwrap()
    }

    fn map(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_uncompilable_template() {
        let result = service()
            .create(create_dto(json!({
                "title": "Broken",
                "content": "Hello {{ name",
                "is_template": true
            })))
            .await;

        match result {
            Err(AppError::Validation(lines)) => assert!(lines[0].starts_with("content:")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plain_prompt_content_is_not_compiled() {
        let created = service()
            .create(create_dto(json!({
                "title": "Literal",
                "content": "Use {{ braces"
            })))
            .await
            .unwrap();
        assert!(!created.is_template);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_settings() {
        let result = service()
            .create(create_dto(json!({
                "title": "Hot",
                "content": "c",
                "settings": {"temperature": 3.0}
            })))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_render_uses_defaults_and_input() {
        let service = service();
        let prompt = service
            .create(create_dto(json!({
                "title": "Ad",
                "content": "Write a {{ tone }} ad for {{ product }}",
                "is_template": true,
                "variables": {
                    "product": {"type": "string", "required": true},
                    "tone": {"type": "string", "default_value": "friendly"}
                }
            })))
            .await
            .unwrap();

        let rendered = service
            .render(
                prompt.id,
                RenderPromptDto {
                    input_data: map(json!({"product": "shoes"})),
                },
            )
            .await
            .unwrap();
        assert_eq!(rendered.rendered, "Write a friendly ad for shoes");

        let missing = service
            .render(prompt.id, RenderPromptDto::default())
            .await;
        match missing {
            Err(AppError::Validation(lines)) => {
                assert_eq!(lines, vec!["input_data.product: required variable is missing"])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_flipping_template_flag_checks_content() {
        let service = service();
        let prompt = service
            .create(create_dto(json!({"title": "Literal", "content": "{{ oops"})))
            .await
            .unwrap();

        let dto: UpdatePromptDto = serde_json::from_value(json!({"is_template": true})).unwrap();
        assert!(matches!(
            service.update(prompt.id, dto).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_soft_and_permanent_delete() {
        let service = service();
        let prompt = service
            .create(create_dto(json!({"title": "Gone", "content": "c"})))
            .await
            .unwrap();

        service.delete(prompt.id, false).await.unwrap();
        assert!(!service.get_by_id(prompt.id).await.unwrap().is_active);

        service.delete(prompt.id, true).await.unwrap();
        assert!(matches!(
            service.get_by_id(prompt.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(prompt.id, true).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_each_others_fields() {
        let service = PromptService::new(Arc::new(SlowPrompts(Arc::new(MemoryStore::new()))));
        let prompt = service
            .create(create_dto(json!({"title": "Old", "content": "c"})))
            .await
            .unwrap();

        let retitle: UpdatePromptDto = serde_json::from_value(json!({"title": "New"})).unwrap();
        let rate: UpdatePromptDto = serde_json::from_value(json!({"rating": 4.5})).unwrap();
        let (first, second) = tokio::join!(
            service.update(prompt.id, retitle),
            service.update(prompt.id, rate)
        );
        first.unwrap();
        second.unwrap();

        let stored = service.get_by_id(prompt.id).await.unwrap();
        assert_eq!(stored.title, "New");
        assert!(stored.rating.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_prompt_is_not_found() {
        let dto: UpdatePromptDto = serde_json::from_value(json!({"title": "New"})).unwrap();
        assert!(matches!(
            service().update(404, dto).await,
            Err(AppError::NotFound(_))
        ));
    }
}
