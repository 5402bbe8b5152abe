mod category;

pub use category::{NewPromptCategory, PromptCategory};
