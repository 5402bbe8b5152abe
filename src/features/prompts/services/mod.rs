mod prompt_service;

pub use prompt_service::{bind_variables, PromptService};
