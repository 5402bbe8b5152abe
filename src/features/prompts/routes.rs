use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::prompts::{handlers, services::PromptService};

/// Create routes for prompt management
pub fn routes(service: Arc<PromptService>) -> Router {
    Router::new()
        .route(
            "/api/prompts",
            get(handlers::list_prompts).post(handlers::create_prompt),
        )
        .route(
            "/api/prompts/{id}",
            get(handlers::get_prompt)
                .patch(handlers::update_prompt)
                .delete(handlers::delete_prompt),
        )
        .route("/api/prompts/{id}/render", post(handlers::render_prompt))
        .with_state(service)
}
