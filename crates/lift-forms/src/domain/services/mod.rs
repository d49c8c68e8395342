//! Domain services

pub mod submission;

pub use submission::{validate_submission, FieldError, SubmittedValue, ValidationErrorKind};
