use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::executions::dtos::{
    CreateExecutionDto, ExecutionQueryParams, ExecutionResponseDto, UpdateExecutionDto,
};
use crate::features::executions::models::PromptExecution;
use crate::features::executions::repositories::{ExecutionEdit, ExecutionRepository};
use crate::features::prompts::dtos::parse_model_settings;
use crate::features::prompts::repositories::PromptRepository;
use crate::features::prompts::services::bind_variables;

/// Service for recording prompt executions and attaching their results
pub struct ExecutionService {
    executions: Arc<dyn ExecutionRepository>,
    prompts: Arc<dyn PromptRepository>,
}

impl ExecutionService {
    pub fn new(
        executions: Arc<dyn ExecutionRepository>,
        prompts: Arc<dyn PromptRepository>,
    ) -> Self {
        Self {
            executions,
            prompts,
        }
    }

    async fn find(&self, id: i64) -> Result<PromptExecution> {
        self.executions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Execution with id {} not found", id)))
    }

    /// Record an execution and bump the prompt's usage
    pub async fn record(&self, dto: CreateExecutionDto) -> Result<ExecutionResponseDto> {
        let prompt = self.prompts.find_by_id(dto.prompt_id).await?.ok_or_else(|| {
            AppError::InvalidReference(format!(
                "execution references prompt {} which does not exist",
                dto.prompt_id
            ))
        })?;

        bind_variables(&prompt, &dto.input_data)?;
        parse_model_settings("model_settings", &dto.model_settings)?;

        let execution = self.executions.record(dto.into_new()).await?;

        tracing::info!(
            "Execution recorded: id={}, prompt_id={}, model={:?}",
            execution.id,
            execution.prompt_id,
            execution.model_name
        );

        Ok(execution.into())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<ExecutionResponseDto> {
        Ok(self.find(id).await?.into())
    }

    /// Execution history of a prompt, newest first
    pub async fn list_for_prompt(
        &self,
        prompt_id: i64,
        params: ExecutionQueryParams,
    ) -> Result<(Vec<ExecutionResponseDto>, i64)> {
        if self.prompts.find_by_id(prompt_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Prompt with id {} not found",
                prompt_id
            )));
        }

        let pagination = params.pagination();
        let (executions, total) = self
            .executions
            .list_for_prompt(
                prompt_id,
                params.status,
                pagination.limit(),
                pagination.offset(),
            )
            .await?;

        Ok((
            executions.into_iter().map(ExecutionResponseDto::from).collect(),
            total,
        ))
    }

    /// Attach output, timing, cost or feedback
    pub async fn update(&self, id: i64, dto: UpdateExecutionDto) -> Result<ExecutionResponseDto> {
        let edit: ExecutionEdit = Box::new(move |execution: &mut PromptExecution| {
            dto.apply(execution);
            Ok(())
        });

        let execution = self
            .executions
            .update(id, edit)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Execution with id {} not found", id)))?;

        tracing::info!(
            "Execution updated: id={}, status={}",
            execution.id,
            execution.status
        );

        Ok(execution.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::executions::models::ExecutionStatus;
    use crate::features::prompts::models::NewPrompt;
    use crate::modules::storage::MemoryStore;
    use crate::shared::types::JsonMap;
    use serde_json::json;

    fn map(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    async fn setup() -> (ExecutionService, Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let prompts: &dyn PromptRepository = store.as_ref();
        let prompt = prompts
            .insert(NewPrompt {
                title: "Ad copy".to_string(),
                description: String::new(),
                content: "Write an ad for {{product}}".to_string(),
                version: "1.0.0".to_string(),
                is_template: true,
                variables: map(json!({"product": {"type": "string", "required": true}})),
                settings: JsonMap::new(),
                prompt_metadata: JsonMap::new(),
                tags: Vec::new(),
                category_id: None,
            })
            .await
            .unwrap();

        (
            ExecutionService::new(store.clone(), store.clone()),
            store,
            prompt.id,
        )
    }

    fn create_dto(prompt_id: i64, input: serde_json::Value) -> CreateExecutionDto {
        serde_json::from_value(json!({
            "prompt_id": prompt_id,
            "input_data": input,
            "model_name": "gpt-4"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_record_defaults_and_usage_bump() {
        let (service, store, prompt_id) = setup().await;

        let execution = service
            .record(create_dto(prompt_id, json!({"product": "shoes"})))
            .await
            .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.completed_at, None);

        service
            .record(create_dto(prompt_id, json!({"product": "hats"})))
            .await
            .unwrap();

        let prompts: &dyn PromptRepository = store.as_ref();
        let prompt = prompts.find_by_id(prompt_id).await.unwrap().unwrap();
        assert_eq!(prompt.usage_count, 2);
        assert!(prompt.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_record_requires_declared_variables() {
        let (service, store, prompt_id) = setup().await;

        let result = service.record(create_dto(prompt_id, json!({}))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let prompts: &dyn PromptRepository = store.as_ref();
        let prompt = prompts.find_by_id(prompt_id).await.unwrap().unwrap();
        assert_eq!(prompt.usage_count, 0);
    }

    #[tokio::test]
    async fn test_record_unknown_prompt_is_invalid_reference() {
        let (service, _, _) = setup().await;

        let result = service
            .record(create_dto(999, json!({"product": "shoes"})))
            .await;
        assert!(matches!(result, Err(AppError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_record_validates_model_settings() {
        let (service, _, prompt_id) = setup().await;

        let mut dto = create_dto(prompt_id, json!({"product": "shoes"}));
        dto.model_settings = map(json!({"top_p": 1.1}));
        match service.record(dto).await {
            Err(AppError::Validation(lines)) => {
                assert!(lines[0].starts_with("model_settings.top_p"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_for_prompt_filters_by_status() {
        let (service, _, prompt_id) = setup().await;
        let first = service
            .record(create_dto(prompt_id, json!({"product": "a"})))
            .await
            .unwrap();
        service
            .record(create_dto(prompt_id, json!({"product": "b"})))
            .await
            .unwrap();

        let failed: UpdateExecutionDto =
            serde_json::from_value(json!({"status": "failed"})).unwrap();
        service.update(first.id, failed).await.unwrap();

        let (all, total) = service
            .list_for_prompt(prompt_id, ExecutionQueryParams::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(all[0].input_data["product"], "b");

        let params = ExecutionQueryParams {
            status: Some(ExecutionStatus::Failed),
            ..ExecutionQueryParams::default()
        };
        let (failed, total) = service.list_for_prompt(prompt_id, params).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(failed[0].id, first.id);
    }

    #[tokio::test]
    async fn test_result_and_feedback_updates_interleave() {
        let (service, _, prompt_id) = setup().await;
        let service = Arc::new(service);
        let execution = service
            .record(create_dto(prompt_id, json!({"product": "shoes"})))
            .await
            .unwrap();

        let handles: Vec<_> = [
            json!({"output_data": {"text": "Step into comfort."}}),
            json!({"user_rating": 5}),
            json!({"token_count": 42}),
            json!({"user_feedback": "Punchy"}),
        ]
        .into_iter()
        .map(|body| {
            let service = service.clone();
            let id = execution.id;
            tokio::spawn(async move {
                let dto: UpdateExecutionDto = serde_json::from_value(body).unwrap();
                service.update(id, dto).await.unwrap();
            })
        })
        .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = service.get_by_id(execution.id).await.unwrap();
        assert_eq!(stored.output_data["text"], "Step into comfort.");
        assert_eq!(stored.user_rating, Some(5));
        assert_eq!(stored.token_count, Some(42));
        assert_eq!(stored.user_feedback.as_deref(), Some("Punchy"));
    }
}
