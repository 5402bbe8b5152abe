use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::stats::dtos::{PromptStatsDto, StatsQuery};
use crate::features::stats::services::StatsService;
use crate::shared::types::ApiResponse;

/// Prompt library statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Prompt statistics", body = ApiResponse<PromptStatsDto>)
    ),
    tag = "stats"
)]
pub async fn get_prompt_stats(
    State(service): State<Arc<StatsService>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<PromptStatsDto>>> {
    let stats = service.prompt_stats(query).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}
