use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

lazy_static! {
    /// Regex for hex color codes: `#` followed by exactly six hex digits
    /// - Valid: "#3B82F6", "#ff0000"
    /// - Invalid: "3B82F6", "#FFF", "#GGGGGG", "#3B82F6FF"
    pub static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

/// Flatten validator errors into `field: constraint` lines, sorted by field.
pub fn describe_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut lines = Vec::new();
    collect_errors(None, errors, &mut lines);
    lines.sort();
    lines
}

fn collect_errors(prefix: Option<&str>, errors: &ValidationErrors, lines: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    lines.push(format!("{}: {}", path, describe_error(error)));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_errors(Some(&path), nested, lines),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_errors(Some(&format!("{}[{}]", path, index)), nested, lines);
                }
            }
        }
    }
}

fn describe_error(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let mut params: Vec<String> = error
        .params
        .iter()
        .filter(|(name, _)| *name != "value")
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    params.sort();

    if params.is_empty() {
        error.code.to_string()
    } else {
        format!("{} ({})", error.code, params.join(", "))
    }
}

/// Build a validation error carrying a human readable message
pub fn error_with_message(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

/// Length check in characters, matching the `length(max = ..)` derive rule
pub fn check_max_chars(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max: u64,
) {
    if value.chars().count() as u64 > max {
        errors.add(
            field,
            error_with_message("length", format!("must be at most {} characters", max)),
        );
    }
}

/// Non-empty check, matching the `length(min = 1)` derive rule
pub fn check_not_empty(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.add(
            field,
            error_with_message("length", "must not be empty".to_string()),
        );
    }
}

pub fn check_hex_color(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if !HEX_COLOR_REGEX.is_match(value) {
        errors.add(
            field,
            error_with_message(
                "hex_color",
                "must be a 7-character hex color code like #3B82F6".to_string(),
            ),
        );
    }
}

/// Check that a decimal fits a `NUMERIC(max_digits, scale)` column without rounding.
pub fn check_decimal_precision(value: &Decimal, scale: u32, max_digits: u32) -> Result<(), String> {
    let normalized = value.normalize();
    if normalized.scale() > scale {
        return Err(format!("must have at most {} decimal places", scale));
    }

    let integer_digits = normalized
        .abs()
        .trunc()
        .to_string()
        .trim_start_matches('0')
        .len() as u32;
    if integer_digits > max_digits - scale {
        return Err(format!(
            "must have at most {} digits before the decimal point",
            max_digits - scale
        ));
    }

    Ok(())
}

/// `Ok` when nothing was recorded, otherwise the collected errors
pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check an inclusive decimal range
pub fn check_decimal_range(value: &Decimal, min: Decimal, max: Decimal) -> Result<(), String> {
    if *value < min || *value > max {
        return Err(format!("must be between {} and {}", min, max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_hex_color_regex_valid() {
        assert!(HEX_COLOR_REGEX.is_match("#3B82F6"));
        assert!(HEX_COLOR_REGEX.is_match("#ff0000"));
        assert!(HEX_COLOR_REGEX.is_match("#000000"));
    }

    #[test]
    fn test_hex_color_regex_invalid() {
        assert!(!HEX_COLOR_REGEX.is_match("3B82F6")); // missing hash
        assert!(!HEX_COLOR_REGEX.is_match("#FFF")); // short form
        assert!(!HEX_COLOR_REGEX.is_match("#GGGGGG")); // not hex
        assert!(!HEX_COLOR_REGEX.is_match("#3B82F6FF")); // too long
        assert!(!HEX_COLOR_REGEX.is_match(""));
    }

    #[test]
    fn test_decimal_precision() {
        let d = |s: &str| Decimal::from_str(s).unwrap();

        assert!(check_decimal_precision(&d("4.5"), 2, 3).is_ok());
        assert!(check_decimal_precision(&d("4.50"), 2, 3).is_ok());
        assert!(check_decimal_precision(&d("4.500"), 2, 3).is_ok()); // trailing zero only
        assert!(check_decimal_precision(&d("4.555"), 2, 3).is_err());
        assert!(check_decimal_precision(&d("12.5"), 2, 3).is_err());

        assert!(check_decimal_precision(&d("9999.999999"), 6, 10).is_ok());
        assert!(check_decimal_precision(&d("10000"), 6, 10).is_err());
        assert!(check_decimal_precision(&d("0.0000001"), 6, 10).is_err());
        assert!(check_decimal_precision(&d("0"), 6, 10).is_ok());
    }

    #[test]
    fn test_decimal_range_is_inclusive() {
        let zero = Decimal::ZERO;
        let five = Decimal::new(5, 0);

        assert!(check_decimal_range(&Decimal::new(0, 2), zero, five).is_ok());
        assert!(check_decimal_range(&Decimal::new(500, 2), zero, five).is_ok());
        assert!(check_decimal_range(&Decimal::new(501, 2), zero, five).is_err());
        assert!(check_decimal_range(&Decimal::new(-1, 2), zero, five).is_err());
    }

    #[test]
    fn test_describe_errors_names_field_and_constraint() {
        let mut errors = ValidationErrors::new();
        check_max_chars(&mut errors, "title", &"x".repeat(201), 200);
        check_hex_color(&mut errors, "color", "red");

        let lines = describe_errors(&errors);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("color: "));
        assert_eq!(lines[1], "title: must be at most 200 characters");
    }

    #[test]
    fn test_check_max_chars_counts_characters_not_bytes() {
        let mut errors = ValidationErrors::new();
        check_max_chars(&mut errors, "name", &"é".repeat(100), 100);
        assert!(errors.errors().is_empty());
    }
}
