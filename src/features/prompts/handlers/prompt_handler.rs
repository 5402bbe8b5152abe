use axum::{extract::Path, extract::Query, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::prompts::dtos::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, RenderPromptDto, RenderedPromptDto,
    UpdatePromptDto,
};
use crate::features::prompts::services::PromptService;
use crate::shared::types::{ApiResponse, Meta};

/// Query params for deleting a prompt
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeletePromptQuery {
    /// Remove the prompt and its executions instead of deactivating it
    #[serde(default)]
    pub permanent: bool,
}

/// Create a new prompt
#[utoipa::path(
    post,
    path = "/api/prompts",
    request_body = CreatePromptDto,
    responses(
        (status = 201, description = "Prompt created successfully", body = ApiResponse<PromptResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 422, description = "Category does not exist")
    ),
    tag = "prompts"
)]
pub async fn create_prompt(
    State(service): State<Arc<PromptService>>,
    AppJson(dto): AppJson<CreatePromptDto>,
) -> Result<(StatusCode, Json<ApiResponse<PromptResponseDto>>)> {
    dto.validate()?;

    let prompt = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(prompt), None, None)),
    ))
}

/// Get a prompt by ID
#[utoipa::path(
    get,
    path = "/api/prompts/{id}",
    params(
        ("id" = i64, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Prompt retrieved successfully", body = ApiResponse<PromptResponseDto>),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts"
)]
pub async fn get_prompt(
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PromptResponseDto>>> {
    let prompt = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// List prompts with pagination and filters
#[utoipa::path(
    get,
    path = "/api/prompts",
    params(PromptQueryParams),
    responses(
        (status = 200, description = "Prompts retrieved successfully", body = ApiResponse<Vec<PromptResponseDto>>)
    ),
    tag = "prompts"
)]
pub async fn list_prompts(
    State(service): State<Arc<PromptService>>,
    Query(params): Query<PromptQueryParams>,
) -> Result<Json<ApiResponse<Vec<PromptResponseDto>>>> {
    let (prompts, total) = service.list(params).await?;
    Ok(Json(ApiResponse::success(
        Some(prompts),
        None,
        Some(Meta { total }),
    )))
}

/// Partially update a prompt
///
/// Absent fields are left unchanged; `null` clears `rating` and `category_id`.
#[utoipa::path(
    patch,
    path = "/api/prompts/{id}",
    params(
        ("id" = i64, Path, description = "Prompt ID")
    ),
    request_body = UpdatePromptDto,
    responses(
        (status = 200, description = "Prompt updated successfully", body = ApiResponse<PromptResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Prompt not found"),
        (status = 422, description = "Category does not exist")
    ),
    tag = "prompts"
)]
pub async fn update_prompt(
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdatePromptDto>,
) -> Result<Json<ApiResponse<PromptResponseDto>>> {
    dto.validate()?;

    let prompt = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// Delete a prompt (soft delete unless `permanent=true`)
#[utoipa::path(
    delete,
    path = "/api/prompts/{id}",
    params(
        ("id" = i64, Path, description = "Prompt ID"),
        DeletePromptQuery
    ),
    responses(
        (status = 200, description = "Prompt deleted successfully"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts"
)]
pub async fn delete_prompt(
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
    Query(query): Query<DeletePromptQuery>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id, query.permanent).await?;
    Ok(Json(ApiResponse::success(None, None, None)))
}

/// Render a prompt's content with variable bindings
#[utoipa::path(
    post,
    path = "/api/prompts/{id}/render",
    params(
        ("id" = i64, Path, description = "Prompt ID")
    ),
    request_body = RenderPromptDto,
    responses(
        (status = 200, description = "Prompt rendered", body = ApiResponse<RenderedPromptDto>),
        (status = 400, description = "Missing or undefined variables"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts"
)]
pub async fn render_prompt(
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<RenderPromptDto>,
) -> Result<Json<ApiResponse<RenderedPromptDto>>> {
    let rendered = service.render(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(rendered), None, None)))
}
