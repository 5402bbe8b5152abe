//! Template engine for prompt content using Jinja2 syntax.
//!
//! Prompt content is stored in the database, so each render compiles the
//! template on the fly. Undefined variables are errors, never empty strings.

use minijinja::{Environment, UndefinedBehavior, Value};
use thiserror::Error;

use crate::shared::types::JsonMap;

const INLINE_TEMPLATE: &str = "prompt";

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template does not compile: {0}")]
    Syntax(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

/// Check that `content` compiles as a template
pub fn validate_template(content: &str) -> Result<(), TemplateError> {
    let mut env = environment();
    env.add_template(INLINE_TEMPLATE, content)
        .map_err(|e| TemplateError::Syntax(e.to_string()))
}

/// Render `content` with the given variable bindings.
///
/// # Example
/// ```ignore
/// let mut ctx = JsonMap::new();
/// ctx.insert("product".into(), "shoes".into());
///
/// let text = render_content("Write an ad for {{ product }}", &ctx)?;
/// ```
pub fn render_content(content: &str, ctx: &JsonMap) -> Result<String, TemplateError> {
    let mut env = environment();
    env.add_template(INLINE_TEMPLATE, content)
        .map_err(|e| TemplateError::Syntax(e.to_string()))?;

    let template = env
        .get_template(INLINE_TEMPLATE)
        .map_err(|e| TemplateError::RenderError(e.to_string()))?;

    let render_ctx = Value::from_serialize(ctx);

    template
        .render(render_ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_render_substitutes_variables() {
        let rendered = render_content(
            "Write an ad for {{ product }} in {{ words }} words",
            &ctx(json!({"product": "shoes", "words": 50})),
        )
        .unwrap();
        assert_eq!(rendered, "Write an ad for shoes in 50 words");
    }

    #[test]
    fn test_render_fails_on_undefined_variable() {
        let result = render_content("Hello {{ name }}", &JsonMap::new());
        assert!(matches!(result, Err(TemplateError::RenderError(_))));
    }

    #[test]
    fn test_validate_rejects_broken_syntax() {
        assert!(validate_template("Hello {{ name }}").is_ok());
        assert!(matches!(
            validate_template("Hello {{ name"),
            Err(TemplateError::Syntax(_))
        ));
    }

    #[test]
    fn test_render_supports_loops() {
        let rendered = render_content(
            "{% for item in items %}- {{ item }}\n{% endfor %}",
            &ctx(json!({"items": ["a", "b"]})),
        )
        .unwrap();
        assert_eq!(rendered, "- a\n- b\n");
    }
}
