//! Rendering of stored prompt content.
//!
//! Prompts flagged `is_template` use Jinja2 syntax (`{{ variable }}`,
//! `{% for %}` and friends). Bindings come from the caller's `input_data`,
//! falling back to each variable's declared `default_value`.

pub mod engine;

pub use engine::{render_content, validate_template, TemplateError};
