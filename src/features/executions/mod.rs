//! Execution records: one row per invocation of a prompt.
//!
//! Recording an execution bumps the prompt's `usage_count` and `last_used_at`.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/executions` | Record execution |
//! | GET | `/api/executions/{id}` | Get execution |
//! | PATCH | `/api/executions/{id}` | Attach output, timing, cost or feedback |
//! | GET | `/api/prompts/{id}/executions` | Execution history of a prompt |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::ExecutionService;
