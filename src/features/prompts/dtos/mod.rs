pub mod prompt_dto;
pub mod schema_dto;

pub use prompt_dto::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, RenderPromptDto, RenderedPromptDto,
    UpdatePromptDto,
};
pub use schema_dto::{
    parse_model_settings, parse_variable_definitions, ModelSettings, PromptVariableDefinition,
    VariableType,
};
