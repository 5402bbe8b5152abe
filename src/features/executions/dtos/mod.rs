pub mod execution_dto;

pub use execution_dto::{
    CreateExecutionDto, ExecutionQueryParams, ExecutionResponseDto, UpdateExecutionDto,
};
