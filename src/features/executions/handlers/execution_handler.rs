use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::executions::dtos::{
    CreateExecutionDto, ExecutionQueryParams, ExecutionResponseDto, UpdateExecutionDto,
};
use crate::features::executions::services::ExecutionService;
use crate::shared::types::{ApiResponse, Meta};

/// Record an execution of a prompt
///
/// The execution starts with status `completed` and no `completed_at`.
#[utoipa::path(
    post,
    path = "/api/executions",
    request_body = CreateExecutionDto,
    responses(
        (status = 201, description = "Execution recorded", body = ApiResponse<ExecutionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 422, description = "Prompt does not exist")
    ),
    tag = "executions"
)]
pub async fn record_execution(
    State(service): State<Arc<ExecutionService>>,
    AppJson(dto): AppJson<CreateExecutionDto>,
) -> Result<(StatusCode, Json<ApiResponse<ExecutionResponseDto>>)> {
    dto.validate()?;

    let execution = service.record(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(execution), None, None)),
    ))
}

/// Get an execution by ID
#[utoipa::path(
    get,
    path = "/api/executions/{id}",
    params(
        ("id" = i64, Path, description = "Execution ID")
    ),
    responses(
        (status = 200, description = "Execution found", body = ApiResponse<ExecutionResponseDto>),
        (status = 404, description = "Execution not found")
    ),
    tag = "executions"
)]
pub async fn get_execution(
    State(service): State<Arc<ExecutionService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ExecutionResponseDto>>> {
    let execution = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(execution), None, None)))
}

/// Partially update an execution
#[utoipa::path(
    patch,
    path = "/api/executions/{id}",
    params(
        ("id" = i64, Path, description = "Execution ID")
    ),
    request_body = UpdateExecutionDto,
    responses(
        (status = 200, description = "Execution updated", body = ApiResponse<ExecutionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Execution not found")
    ),
    tag = "executions"
)]
pub async fn update_execution(
    State(service): State<Arc<ExecutionService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateExecutionDto>,
) -> Result<Json<ApiResponse<ExecutionResponseDto>>> {
    dto.validate()?;

    let execution = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(execution), None, None)))
}

/// List executions of a prompt (newest first)
#[utoipa::path(
    get,
    path = "/api/prompts/{id}/executions",
    params(
        ("id" = i64, Path, description = "Prompt ID"),
        ExecutionQueryParams
    ),
    responses(
        (status = 200, description = "Executions of the prompt", body = ApiResponse<Vec<ExecutionResponseDto>>),
        (status = 404, description = "Prompt not found")
    ),
    tag = "executions"
)]
pub async fn list_prompt_executions(
    State(service): State<Arc<ExecutionService>>,
    Path(id): Path<i64>,
    Query(params): Query<ExecutionQueryParams>,
) -> Result<Json<ApiResponse<Vec<ExecutionResponseDto>>>> {
    let (executions, total) = service.list_for_prompt(id, params).await?;
    Ok(Json(ApiResponse::success(
        Some(executions),
        None,
        Some(Meta { total }),
    )))
}
