use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use fake::faker::lorem::en::Words;
use fake::Fake;
use serde_json::{json, Value};

use crate::core::config::AppConfig;
use crate::core::router;
use crate::features::stats::dtos::MostUsedCategoryBy;
use crate::modules::storage::{MemoryStore, Repositories};

pub fn test_app_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_allowed_origins: vec!["*".to_string()],
        max_request_body_size: 2 * 1024 * 1024,
    }
}

/// Full application router over a fresh in-memory store
pub fn test_server() -> TestServer {
    test_server_with(Arc::new(MemoryStore::new()), MostUsedCategoryBy::default())
}

pub fn test_server_with(store: Arc<MemoryStore>, most_used_by: MostUsedCategoryBy) -> TestServer {
    let repos = Repositories::from_memory(store);
    let app = router::with_layers(router::api_router(&repos, most_used_by), &test_app_config());
    TestServer::new(app).unwrap()
}

/// The `data` member of the response envelope
pub fn data(response: &TestResponse) -> Value {
    response.json::<Value>()["data"].clone()
}

/// The `errors` member of the response envelope
pub fn errors(response: &TestResponse) -> Vec<String> {
    serde_json::from_value(response.json::<Value>()["errors"].clone()).unwrap_or_default()
}

/// A random category name, suffixed so repeated calls never collide
pub fn fake_category_name(n: usize) -> String {
    let words: Vec<String> = Words(1..3).fake();
    format!("{} {}", words.join(" "), n)
}

pub async fn create_category(server: &TestServer, name: &str) -> i64 {
    let response = server
        .post("/api/categories")
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    data(&response)["id"].as_i64().unwrap()
}

pub async fn create_prompt(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/prompts").json(&body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    data(&response)
}
