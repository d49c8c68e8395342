//! Frontend submission validation
//!
//! Errors are reported per field so the caller can show them inline; a
//! failing field blocks only the current submission.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::aggregates::{Field, Form};
use crate::domain::value_objects::FieldType;

/// A value posted for one field, keyed by field name
#[derive(Clone, Debug, PartialEq)]
pub enum SubmittedValue {
    Text(String),
    Many(Vec<String>),
    File { file_name: String, size: u64 },
}

impl SubmittedValue {
    fn is_blank(&self) -> bool {
        match self {
            SubmittedValue::Text(s) => s.trim().is_empty(),
            SubmittedValue::Many(values) => values.iter().all(|v| v.trim().is_empty()),
            SubmittedValue::File { file_name, .. } => file_name.trim().is_empty(),
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum ValidationErrorKind {
    #[error("This field is required.")]
    Required,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter a valid number.")]
    InvalidNumber,
    #[error("Value must be at least {0}.")]
    BelowMin(f64),
    #[error("Value must be at most {0}.")]
    AboveMax(f64),
    #[error("Please enter a valid date (YYYY-MM-DD).")]
    InvalidDate,
    #[error("Please choose one of the listed options.")]
    UnknownOption,
    #[error("Must be at least {0} characters.")]
    TooShort(u32),
    #[error("Must be at most {0} characters.")]
    TooLong(u32),
    #[error("File type is not allowed.")]
    FileTypeNotAllowed,
    #[error("File is too large (max {0} bytes).")]
    FileTooLarge(u64),
    /// Carries the field's custom message, or the default one
    #[error("{0}")]
    PatternMismatch(String),
}

/// Validation failure for one field
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    pub field_name: String,
    pub kind: ValidationErrorKind,
}

/// Validate submitted values against the form's fields, in display order.
pub fn validate_submission(
    form: &Form,
    values: &HashMap<String, SubmittedValue>,
) -> Vec<FieldError> {
    form.flatten()
        .into_iter()
        .filter_map(|field| {
            validate_field(field, values.get(field.name())).err().map(|kind| FieldError {
                field_name: field.name().to_string(),
                kind,
            })
        })
        .collect()
}

fn validate_field(
    field: &Field,
    value: Option<&SubmittedValue>,
) -> Result<(), ValidationErrorKind> {
    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ if field.required() && field.field_type() != FieldType::Hidden => {
            return Err(ValidationErrorKind::Required)
        }
        _ => return Ok(()),
    };

    match (field.field_type(), value) {
        (FieldType::Email, SubmittedValue::Text(s)) => {
            if !is_valid_email(s.trim()) {
                return Err(ValidationErrorKind::InvalidEmail);
            }
        }
        (FieldType::Number, SubmittedValue::Text(s)) => {
            let n: f64 = s.trim().parse().map_err(|_| ValidationErrorKind::InvalidNumber)?;
            if !n.is_finite() {
                return Err(ValidationErrorKind::InvalidNumber);
            }
            if let Some(min) = field.constraints().min {
                if n < min {
                    return Err(ValidationErrorKind::BelowMin(min));
                }
            }
            if let Some(max) = field.constraints().max {
                if n > max {
                    return Err(ValidationErrorKind::AboveMax(max));
                }
            }
        }
        (FieldType::Date, SubmittedValue::Text(s)) => {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| ValidationErrorKind::InvalidDate)?;
        }
        (FieldType::Select | FieldType::Radio, SubmittedValue::Text(s)) => {
            if !field.options().iter().any(|o| o == s.trim()) {
                return Err(ValidationErrorKind::UnknownOption);
            }
        }
        (FieldType::Checkbox | FieldType::Select, SubmittedValue::Many(values)) => {
            let all_known = values
                .iter()
                .filter(|v| !v.trim().is_empty())
                .all(|v| field.options().iter().any(|o| o == v.trim()));
            if !all_known {
                return Err(ValidationErrorKind::UnknownOption);
            }
        }
        (FieldType::Checkbox, SubmittedValue::Text(s)) => {
            if !field.options().iter().any(|o| o == s.trim()) {
                return Err(ValidationErrorKind::UnknownOption);
            }
        }
        (FieldType::File, SubmittedValue::File { file_name, size }) => {
            check_file(field, file_name, *size)?;
        }
        _ => {}
    }

    if let SubmittedValue::Text(s) = value {
        let len = s.trim().chars().count() as u32;
        if let Some(min) = field.validation().min_length {
            if len < min {
                return Err(ValidationErrorKind::TooShort(min));
            }
        }
        if let Some(max) = field.validation().max_length {
            if len > max {
                return Err(ValidationErrorKind::TooLong(max));
            }
        }
        check_pattern(field, s.trim())?;
    }
    Ok(())
}

const DEFAULT_PATTERN_MESSAGE: &str = "Please match the requested format.";

/// Whole-value match, like the HTML `pattern` attribute. A pattern that does
/// not compile is skipped rather than blocking every submission.
fn check_pattern(field: &Field, value: &str) -> Result<(), ValidationErrorKind> {
    let Some(pattern) = field.validation().pattern.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(());
    };
    let Some(re) = Regex::new(&format!("^(?:{})$", pattern)).ok() else {
        tracing::warn!(field = field.name(), pattern, "ignoring invalid validation pattern");
        return Ok(());
    };
    if re.is_match(value) {
        return Ok(());
    }
    let message = field
        .validation()
        .custom_error
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PATTERN_MESSAGE.to_string());
    Err(ValidationErrorKind::PatternMismatch(message))
}

/// Check a file against the field's accept list and size limit
pub(crate) fn check_file(field: &Field, file_name: &str, size: u64) -> Result<(), ValidationErrorKind> {
    if let Some(accept) = field.constraints().accept.as_deref() {
        if !accepts(accept, file_name) {
            return Err(ValidationErrorKind::FileTypeNotAllowed);
        }
    }
    if let Some(limit) = field.validation().max_file_size {
        if size > limit {
            return Err(ValidationErrorKind::FileTooLarge(limit));
        }
    }
    Ok(())
}

/// Match a file name against an `accept` list such as `.pdf,.docx,image/*`.
/// MIME wildcards are matched through the extension table below.
pub fn accepts(accept: &str, file_name: &str) -> bool {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();

    accept
        .split(',')
        .map(|a| a.trim().to_ascii_lowercase())
        .filter(|a| !a.is_empty())
        .any(|a| {
            if let Some(wanted) = a.strip_prefix('.') {
                wanted == ext
            } else if let Some(family) = a.strip_suffix("/*") {
                mime_family(&ext) == Some(family)
            } else {
                a == "*"
            }
        })
}

fn mime_family(ext: &str) -> Option<&'static str> {
    match ext {
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "bmp" => Some("image"),
        "mp4" | "webm" | "mov" | "avi" => Some("video"),
        "mp3" | "wav" | "ogg" | "m4a" => Some("audio"),
        "txt" | "csv" | "html" => Some("text"),
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "zip" => Some("application"),
        _ => None,
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
