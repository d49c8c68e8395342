//! Field entity
//!
//! One input definition. The field type decides which of placeholder and
//! options are meaningful.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::options::clean_options;
use crate::domain::value_objects::{parse_options_text, FieldId, FieldType};
use crate::error::{FormsError, Result};

/// Pattern and length rules applied to text-like inputs
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_error: Option<String>,
    /// Upload limit in bytes for file fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
}

impl FieldValidation {
    pub fn is_empty(&self) -> bool {
        self == &FieldValidation::default()
    }
}

/// Type-specific input attributes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    /// Visible lines for textarea
    pub rows: Option<u32>,
    /// Multiple selection / multiple files
    pub multiple: bool,
    /// Accepted file types, e.g. `.pdf,.docx,image/*`
    pub accept: Option<String>,
}

/// A single form input
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub(crate) id: FieldId,
    pub(crate) field_type: FieldType,
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) placeholder: Option<String>,
    pub(crate) required: bool,
    pub(crate) options: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) class_name: Option<String>,
    pub(crate) default_value: Option<String>,
    /// Fixed value for hidden fields; persisted URL for file and signature capture
    pub(crate) value: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) validation: FieldValidation,
    pub(crate) constraints: FieldConstraints,
}

/// Partial edit applied from the edit surface
#[derive(Clone, Debug, Default)]
pub struct FieldPatch {
    pub label: Option<String>,
    pub name: Option<String>,
    /// `Some("")` clears the placeholder
    pub placeholder: Option<String>,
    pub required: Option<bool>,
    pub options: Option<OptionsInput>,
    pub description: Option<String>,
    pub class_name: Option<String>,
    pub default_value: Option<String>,
    pub value: Option<String>,
    pub validation: Option<FieldValidation>,
    pub constraints: Option<FieldConstraints>,
}

/// Options as typed into the edit surface or supplied as a list
#[derive(Clone, Debug)]
pub enum OptionsInput {
    Text(String),
    List(Vec<String>),
}

impl OptionsInput {
    fn resolve(self) -> Vec<String> {
        match self {
            OptionsInput::Text(text) => parse_options_text(&text),
            OptionsInput::List(list) => clean_options(list),
        }
    }
}

impl Field {
    /// Create a field with type defaults. `seq` feeds the default name.
    pub fn create(field_type: FieldType, seq: u32) -> Self {
        let options = if field_type.is_choice() {
            vec!["Option 1".to_string(), "Option 2".to_string()]
        } else {
            Vec::new()
        };

        Self {
            id: FieldId::new(),
            field_type,
            name: format!("{}_{}", field_type.as_str(), seq),
            label: field_type.default_label().to_string(),
            placeholder: None,
            required: false,
            options,
            description: None,
            class_name: None,
            default_value: None,
            value: None,
            content: None,
            validation: FieldValidation::default(),
            constraints: FieldConstraints::default(),
        }
    }

    /// Rebuild a field from persisted attributes; no defaults are applied.
    pub(crate) fn restore(id: FieldId, field_type: FieldType, name: String, label: String) -> Self {
        Self {
            id,
            field_type,
            name,
            label,
            placeholder: None,
            required: false,
            options: Vec::new(),
            description: None,
            class_name: None,
            default_value: None,
            value: None,
            content: None,
            validation: FieldValidation::default(),
            constraints: FieldConstraints::default(),
        }
    }

    pub fn id(&self) -> &FieldId { &self.id }
    pub fn field_type(&self) -> FieldType { self.field_type }
    pub fn name(&self) -> &str { &self.name }
    pub fn label(&self) -> &str { &self.label }
    pub fn required(&self) -> bool { self.required }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn class_name(&self) -> Option<&str> { self.class_name.as_deref() }
    pub fn default_value(&self) -> Option<&str> { self.default_value.as_deref() }
    pub fn value(&self) -> Option<&str> { self.value.as_deref() }
    pub fn content(&self) -> Option<&str> { self.content.as_deref() }
    pub fn validation(&self) -> &FieldValidation { &self.validation }
    pub fn constraints(&self) -> &FieldConstraints { &self.constraints }

    /// Placeholder, only for text-like types
    pub fn placeholder(&self) -> Option<&str> {
        if self.field_type.is_text_like() {
            self.placeholder.as_deref()
        } else {
            None
        }
    }

    /// Options, only for choice types
    pub fn options(&self) -> &[String] {
        if self.field_type.is_choice() {
            &self.options
        } else {
            &[]
        }
    }

    /// A choice field needs at least one non-empty option
    pub fn has_valid_options(&self) -> bool {
        !self.field_type.is_choice() || self.options.iter().any(|o| !o.trim().is_empty())
    }

    /// Apply an edit. The whole patch is rejected when it would leave a
    /// choice field without options.
    pub fn apply(&mut self, patch: FieldPatch) -> Result<()> {
        let options = match patch.options {
            Some(input) if self.field_type.is_choice() => {
                let resolved = input.resolve();
                if resolved.is_empty() {
                    return Err(FormsError::EmptyOptions);
                }
                Some(resolved)
            }
            _ => None,
        };

        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(name) = patch.name {
            let name = name.trim();
            if !name.is_empty() {
                self.name = name.to_string();
            }
        }
        if let Some(placeholder) = patch.placeholder {
            if self.field_type.is_text_like() {
                self.placeholder = non_empty(placeholder);
            }
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(options) = options {
            self.options = options;
        }
        if let Some(description) = patch.description {
            self.description = non_empty(description);
        }
        if let Some(class_name) = patch.class_name {
            self.class_name = non_empty(class_name);
        }
        if let Some(default_value) = patch.default_value {
            self.default_value = non_empty(default_value);
        }
        if let Some(value) = patch.value {
            self.value = non_empty(value);
        }
        if let Some(validation) = patch.validation {
            self.validation = validation;
        }
        if let Some(constraints) = patch.constraints {
            self.constraints = constraints;
        }
        Ok(())
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults() {
        let field = Field::create(FieldType::Select, 3);
        assert_eq!(field.name(), "select_3");
        assert_eq!(field.label(), "Select Dropdown");
        assert_eq!(field.options(), ["Option 1", "Option 2"]);
        assert!(!field.required());

        let text = Field::create(FieldType::Text, 1);
        assert!(text.options().is_empty());
    }

    #[test]
    fn test_options_text_blank_lines_dropped() {
        let mut field = Field::create(FieldType::Select, 1);
        field
            .apply(FieldPatch {
                options: Some(OptionsInput::Text("A\n\nB".into())),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(field.options(), ["A", "B"]);
    }

    #[test]
    fn test_empty_options_rejected_and_retained() {
        let mut field = Field::create(FieldType::Radio, 1);
        let result = field.apply(FieldPatch {
            label: Some("Colour".into()),
            options: Some(OptionsInput::Text("\n   \n".into())),
            ..Default::default()
        });
        assert!(matches!(result, Err(FormsError::EmptyOptions)));
        assert_eq!(field.options(), ["Option 1", "Option 2"]);
        assert_eq!(field.label(), "Radio Buttons");
    }

    #[test]
    fn test_non_choice_ignores_options() {
        let mut field = Field::create(FieldType::Email, 1);
        field
            .apply(FieldPatch {
                options: Some(OptionsInput::Text("".into())),
                placeholder: Some("you@example.com".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(field.options().is_empty());
        assert_eq!(field.placeholder(), Some("you@example.com"));
    }

    #[test]
    fn test_placeholder_ignored_for_choice() {
        let mut field = Field::create(FieldType::Checkbox, 1);
        field
            .apply(FieldPatch { placeholder: Some("pick".into()), ..Default::default() })
            .unwrap();
        assert_eq!(field.placeholder(), None);
    }

    #[test]
    fn test_blank_name_keeps_previous() {
        let mut field = Field::create(FieldType::Text, 2);
        field.apply(FieldPatch { name: Some("  ".into()), ..Default::default() }).unwrap();
        assert_eq!(field.name(), "text_2");
    }
}
