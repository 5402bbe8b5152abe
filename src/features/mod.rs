pub mod categories;
pub mod executions;
pub mod prompts;
pub mod stats;
