//! Prompt categories: named, colored groupings for the prompt library.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | List categories |
//! | POST | `/api/categories` | Create category |
//! | GET | `/api/categories/{id}` | Get category |
//! | PATCH | `/api/categories/{id}` | Partially update category |
//! | DELETE | `/api/categories/{id}` | Delete category (prompts become uncategorized) |
//! | GET | `/api/categories/{id}/prompts` | List prompts in category |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::CategoryService;
