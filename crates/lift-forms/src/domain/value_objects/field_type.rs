//! Field type value object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FormsError;

/// The fixed set of inputs the builder can place on a form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Email,
    Number,
    Date,
    File,
    Hidden,
}

impl FieldType {
    /// Palette order
    pub const ALL: [FieldType; 10] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Email,
        FieldType::Number,
        FieldType::Date,
        FieldType::File,
        FieldType::Hidden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Hidden => "hidden",
        }
    }

    /// Label given to a freshly dropped field
    pub fn default_label(&self) -> &'static str {
        match self {
            FieldType::Text => "Text Input",
            FieldType::Textarea => "Textarea",
            FieldType::Select => "Select Dropdown",
            FieldType::Radio => "Radio Buttons",
            FieldType::Checkbox => "Checkboxes",
            FieldType::Email => "Email",
            FieldType::Number => "Number",
            FieldType::Date => "Date",
            FieldType::File => "File Upload",
            FieldType::Hidden => "Hidden Field",
        }
    }

    /// Choice types carry an option list
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio | FieldType::Checkbox)
    }

    /// Text-like types accept a placeholder
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Textarea
                | FieldType::Email
                | FieldType::Number
                | FieldType::Date
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| FormsError::UnknownFieldType(s.to_string()))
    }
}
