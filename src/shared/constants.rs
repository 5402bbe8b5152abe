/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Color given to categories created without one
pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

/// Version given to prompts created without one
pub const DEFAULT_PROMPT_VERSION: &str = "1.0.0";

// =============================================================================
// FIELD LIMITS (characters)
// =============================================================================

pub const CATEGORY_NAME_MAX: u64 = 100;
pub const CATEGORY_DESCRIPTION_MAX: u64 = 500;

pub const PROMPT_TITLE_MAX: u64 = 200;
pub const PROMPT_DESCRIPTION_MAX: u64 = 1000;
pub const PROMPT_CONTENT_MAX: u64 = 10000;
pub const PROMPT_VERSION_MAX: u64 = 20;

pub const ERROR_MESSAGE_MAX: u64 = 1000;
pub const USER_FEEDBACK_MAX: u64 = 2000;

pub const VARIABLE_NAME_MAX: u64 = 100;

// =============================================================================
// DECIMAL PRECISION
// =============================================================================

/// `prompts.rating` is NUMERIC(3, 2)
pub const RATING_SCALE: u32 = 2;
pub const RATING_MAX_DIGITS: u32 = 3;

/// `prompt_executions.cost` is NUMERIC(10, 6)
pub const COST_SCALE: u32 = 6;
pub const COST_MAX_DIGITS: u32 = 10;

/// Trailing window for `PromptStats.recent_executions`
pub const RECENT_EXECUTIONS_WINDOW_DAYS: i64 = 7;
