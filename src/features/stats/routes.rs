use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::stats::handlers;
use crate::features::stats::services::StatsService;

pub fn routes(service: Arc<StatsService>) -> Router {
    Router::new()
        .route("/api/stats", get(handlers::get_prompt_stats))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::features::stats::dtos::MostUsedCategoryBy;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::{
        create_category, create_prompt, data, test_server, test_server_with,
    };

    /// "Writing" holds more prompts, "Coding" has more executions
    async fn seed(server: &axum_test::TestServer) {
        let writing = create_category(server, "Writing").await;
        let coding = create_category(server, "Coding").await;

        for title in ["Essay", "Poem"] {
            create_prompt(
                server,
                json!({"title": title, "content": "Write", "category_id": writing}),
            )
            .await;
        }
        let review = create_prompt(
            server,
            json!({"title": "Review", "content": "Review", "category_id": coding}),
        )
        .await;

        for _ in 0..2 {
            server
                .post("/api/executions")
                .json(&json!({"prompt_id": review["id"]}))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        server
            .patch(&format!("/api/prompts/{}", review["id"]))
            .json(&json!({"rating": "4.00", "is_active": false}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_empty_library() {
        let server = test_server();
        let stats = data(&server.get("/api/stats").await);

        assert_eq!(stats["total_prompts"], 0);
        assert_eq!(stats["total_executions"], 0);
        assert!(stats["avg_rating"].is_null());
        assert!(stats["most_used_category"].is_null());
        assert_eq!(stats["recent_executions"], 0);
    }

    #[tokio::test]
    async fn test_stats_and_ranking_override() {
        let server = test_server();
        seed(&server).await;

        let stats = data(&server.get("/api/stats").await);
        assert_eq!(stats["total_prompts"], 3);
        assert_eq!(stats["active_prompts"], 2);
        assert_eq!(stats["template_prompts"], 0);
        assert_eq!(stats["total_executions"], 2);
        assert_eq!(stats["recent_executions"], 2);
        assert_eq!(stats["avg_rating"], "4.00");
        assert_eq!(stats["most_used_category"], "Coding");

        let stats = data(
            &server
                .get("/api/stats")
                .add_query_param("most_used_by", "prompts")
                .await,
        );
        assert_eq!(stats["most_used_category"], "Writing");
    }

    #[tokio::test]
    async fn test_configured_default_ranking() {
        let server = test_server_with(Arc::new(MemoryStore::new()), MostUsedCategoryBy::Prompts);
        seed(&server).await;

        let stats = data(&server.get("/api/stats").await);
        assert_eq!(stats["most_used_category"], "Writing");
    }
}
