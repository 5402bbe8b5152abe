use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::StatusCode, middleware::from_fn, routing::get, Router};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::{AppConfig, SwaggerConfig};
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::categories::{routes as categories_routes, CategoryService};
use crate::features::executions::{routes as executions_routes, ExecutionService};
use crate::features::prompts::{routes as prompts_routes, PromptService};
use crate::features::stats::dtos::MostUsedCategoryBy;
use crate::features::stats::{routes as stats_routes, StatsService};
use crate::modules::storage::Repositories;

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Feature routes plus `/health`, wired to the given storage
pub fn api_router(repos: &Repositories, most_used_by: MostUsedCategoryBy) -> Router {
    let category_service = Arc::new(CategoryService::new(
        Arc::clone(&repos.categories),
        Arc::clone(&repos.prompts),
    ));
    let prompt_service = Arc::new(PromptService::new(Arc::clone(&repos.prompts)));
    let execution_service = Arc::new(ExecutionService::new(
        Arc::clone(&repos.executions),
        Arc::clone(&repos.prompts),
    ));
    let stats_service = Arc::new(StatsService::new(Arc::clone(&repos.stats), most_used_by));
    tracing::info!("Services initialized (stats rank categories by {:?})", most_used_by);

    Router::new()
        .merge(categories_routes::routes(category_service))
        .merge(prompts_routes::routes(prompt_service))
        .merge(executions_routes::routes(execution_service))
        .merge(stats_routes::routes(stats_service))
        .route("/health", get(health_check))
}

/// Swagger UI and the OpenAPI document, behind basic auth when configured
pub fn swagger_router(config: &SwaggerConfig) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.title.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    if let Some(credentials) = config.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        swagger.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
            credentials,
        ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        swagger
    }
}

/// CORS, body limit, request ids and request tracing
pub fn with_layers(router: Router, config: &AppConfig) -> Router {
    router
        .layer(DefaultBodyLimit::max(config.max_request_body_size))
        .layer(middleware::cors_layer(config.cors_allowed_origins.clone()))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::shared::test_helpers::{create_category, create_prompt, data, test_server};

    #[tokio::test]
    async fn test_health_check() {
        let server = test_server();
        server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let server = test_server();
        let response = server.get("/api/categories").await;
        assert!(response.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_marketing_scenario() {
        let server = test_server();

        let response = server
            .post("/api/categories")
            .json(&json!({"name": "Marketing", "color": "#FF0000"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let category_id = data(&response)["id"].as_i64().unwrap();

        let prompt = create_prompt(
            &server,
            json!({
                "title": "Ad copy",
                "content": "Write an ad for {{product}}",
                "is_template": true,
                "category_id": category_id
            }),
        )
        .await;
        let prompt_id = prompt["id"].as_i64().unwrap();
        assert_eq!(prompt["category_id"], category_id);

        let response = server
            .post("/api/executions")
            .json(&json!({
                "prompt_id": prompt_id,
                "input_data": {"product": "shoes"},
                "model_name": "gpt-4"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let execution = data(&response);
        assert_eq!(execution["status"], "completed");
        assert!(execution["completed_at"].is_null());

        let execution_id = execution["id"].as_i64().unwrap();
        let response = server
            .patch(&format!("/api/executions/{}", execution_id))
            .json(&json!({
                "output_data": {"text": "Step into comfort."},
                "status": "completed",
                "completed_at": "2026-01-02T03:04:05Z"
            }))
            .await;
        response.assert_status_ok();

        let stored = data(&server.get(&format!("/api/executions/{}", execution_id)).await);
        assert_eq!(stored["output_data"], json!({"text": "Step into comfort."}));
        assert_eq!(stored["status"], "completed");
        assert_eq!(stored["completed_at"], "2026-01-02T03:04:05Z");
        assert_eq!(stored["input_data"], json!({"product": "shoes"}));
        assert_eq!(stored["model_name"], "gpt-4");

        let prompt = data(&server.get(&format!("/api/prompts/{}", prompt_id)).await);
        assert_eq!(prompt["usage_count"], 1);
        assert!(!prompt["last_used_at"].is_null());

        let stats = data(&server.get("/api/stats").await);
        assert_eq!(stats["total_executions"], 1);
        assert_eq!(stats["most_used_category"], "Marketing");
    }

    #[tokio::test]
    async fn test_deleting_category_keeps_its_prompts() {
        let server = test_server();
        let category_id = create_category(&server, "Support").await;
        let prompt = create_prompt(
            &server,
            json!({"title": "Reply", "content": "Be kind", "category_id": category_id}),
        )
        .await;

        server
            .delete(&format!("/api/categories/{}", category_id))
            .await
            .assert_status_ok();

        let prompt = data(&server.get(&format!("/api/prompts/{}", prompt["id"])).await);
        assert!(prompt["category_id"].is_null());
    }
}
