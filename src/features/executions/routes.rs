use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::executions::handlers;
use crate::features::executions::services::ExecutionService;

/// Create routes for execution records
pub fn routes(service: Arc<ExecutionService>) -> Router {
    Router::new()
        .route("/api/executions", post(handlers::record_execution))
        .route(
            "/api/executions/{id}",
            get(handlers::get_execution).patch(handlers::update_execution),
        )
        .route(
            "/api/prompts/{id}/executions",
            get(handlers::list_prompt_executions),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use fake::Fake;
    use serde_json::{json, Value};

    use crate::shared::test_helpers::{create_prompt, data, errors, test_server};

    async fn template_prompt(server: &axum_test::TestServer) -> i64 {
        let prompt = create_prompt(
            server,
            json!({
                "title": "Ad copy",
                "content": "Write an ad for {{product}}",
                "is_template": true,
                "variables": {"product": {"type": "string", "required": true}}
            }),
        )
        .await;
        prompt["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_prompt_is_referential_error() {
        let server = test_server();
        server
            .post("/api/executions")
            .json(&json!({"prompt_id": 404, "input_data": {}}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_missing_required_variable_is_rejected() {
        let server = test_server();
        let prompt_id = template_prompt(&server).await;

        let response = server
            .post("/api/executions")
            .json(&json!({"prompt_id": prompt_id, "input_data": {"other": 1}}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            errors(&response),
            vec!["input_data.product: required variable is missing".to_string()]
        );

        let prompt = data(&server.get(&format!("/api/prompts/{}", prompt_id)).await);
        assert_eq!(prompt["usage_count"], 0);
    }

    #[tokio::test]
    async fn test_update_validates_ranges() {
        let server = test_server();
        let prompt_id = template_prompt(&server).await;
        let execution = data(
            &server
                .post("/api/executions")
                .json(&json!({"prompt_id": prompt_id, "input_data": {"product": "tea"}}))
                .await,
        );
        let path = format!("/api/executions/{}", execution["id"]);

        server
            .patch(&path)
            .json(&json!({"user_rating": 6}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .patch(&path)
            .json(&json!({"status": "running"}))
            .await
            .assert_status_not_ok();

        let rating: i32 = (1..=5).fake();
        let response = server
            .patch(&path)
            .json(&json!({
                "user_rating": rating,
                "cost": "0.00125",
                "token_count": 512,
                "execution_time_ms": 830
            }))
            .await;
        response.assert_status_ok();
        let updated = data(&response);
        assert_eq!(updated["user_rating"], rating);
        assert_eq!(updated["cost"], "0.001250");
        assert_eq!(updated["token_count"], 512);
        assert_eq!(updated["input_data"], json!({"product": "tea"}));
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_filterable() {
        let server = test_server();
        let prompt_id = template_prompt(&server).await;

        let mut ids = Vec::new();
        for product in ["tea", "coffee", "juice"] {
            let response = server
                .post("/api/executions")
                .json(&json!({"prompt_id": prompt_id, "input_data": {"product": product}}))
                .await;
            ids.push(data(&response)["id"].as_i64().unwrap());
        }

        server
            .patch(&format!("/api/executions/{}", ids[1]))
            .json(&json!({"status": "failed", "error_message": "timeout"}))
            .await
            .assert_status_ok();

        let history = server
            .get(&format!("/api/prompts/{}/executions", prompt_id))
            .await
            .json::<Value>();
        assert_eq!(history["meta"]["total"], 3);
        assert_eq!(history["data"][0]["id"], ids[2]);
        assert_eq!(history["data"][2]["id"], ids[0]);

        let failed = server
            .get(&format!("/api/prompts/{}/executions", prompt_id))
            .add_query_param("status", "failed")
            .await
            .json::<Value>();
        assert_eq!(failed["meta"]["total"], 1);
        assert_eq!(failed["data"][0]["error_message"], "timeout");

        server
            .get("/api/prompts/999/executions")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
