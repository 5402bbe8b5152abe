mod stats;

pub use stats::PromptStats;
