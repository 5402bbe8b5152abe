mod execution;

pub use execution::{ExecutionStatus, NewExecution, PromptExecution};
