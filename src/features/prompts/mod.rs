//! Prompt library: stored prompt text, template rendering and metadata.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/prompts` | List prompts (paginated, filterable) |
//! | POST | `/api/prompts` | Create prompt |
//! | GET | `/api/prompts/{id}` | Get prompt |
//! | PATCH | `/api/prompts/{id}` | Partially update prompt |
//! | DELETE | `/api/prompts/{id}` | Deactivate prompt, or remove it with `?permanent=true` |
//! | POST | `/api/prompts/{id}/render` | Render template content |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::PromptService;
