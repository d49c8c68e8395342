//! Field edit surface

use crate::domain::aggregates::{Field, FieldPatch, OptionsInput};
use crate::domain::value_objects::{options_to_text, FieldType};

/// Values shown in the edit dialog, pre-populated from the field.
/// `placeholder` exists only for text-like types, `options_text` only for
/// choice types.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSurface {
    pub field_type: FieldType,
    pub label: String,
    pub name: String,
    pub required: bool,
    pub description: String,
    pub placeholder: Option<String>,
    pub options_text: Option<String>,
}

impl EditSurface {
    pub fn open(field: &Field) -> Self {
        let field_type = field.field_type();
        Self {
            field_type,
            label: field.label().to_string(),
            name: field.name().to_string(),
            required: field.required(),
            description: field.description().unwrap_or_default().to_string(),
            placeholder: field_type
                .is_text_like()
                .then(|| field.placeholder().unwrap_or_default().to_string()),
            options_text: field_type.is_choice().then(|| options_to_text(field.options())),
        }
    }

    /// Patch for `Form::update_field`
    pub fn into_patch(self) -> FieldPatch {
        FieldPatch {
            label: Some(self.label),
            name: Some(self.name),
            required: Some(self.required),
            description: Some(self.description),
            placeholder: self.placeholder,
            options: self.options_text.map(OptionsInput::Text),
            ..Default::default()
        }
    }
}
