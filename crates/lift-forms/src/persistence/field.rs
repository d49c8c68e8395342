//! Allow-listed field record
//!
//! Only these attributes cross the wire. Deserialization is lenient about
//! the shapes PHP tends to produce (booleans as "1", numbers as strings,
//! options as newline text or `{label, value}` objects).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::domain::aggregates::{Field, FieldConstraints, FieldValidation};
use crate::domain::value_objects::options::clean_options;
use crate::domain::value_objects::{parse_options_text, FieldId, FieldType};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedField {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_options")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_bool")]
    pub multiple: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SerializedField {
    pub fn from_field(field: &Field, order: u32) -> Self {
        let field_type = field.field_type();
        let constraints = field.constraints();
        Self {
            id: field.id().to_string(),
            name: field.name().to_string(),
            field_type: field_type.as_str().to_string(),
            label: field.label().to_string(),
            placeholder: field.placeholder().map(String::from),
            required: field.required(),
            description: field.description().map(String::from),
            options: field_type.is_choice().then(|| field.options().to_vec()),
            validation: (!field.validation().is_empty()).then(|| field.validation().clone()),
            order: Some(order),
            class_name: field.class_name().map(String::from),
            value: field.value().map(String::from),
            default_value: field.default_value().map(String::from),
            min: constraints.min,
            max: constraints.max,
            step: constraints.step,
            rows: constraints.rows,
            multiple: constraints.multiple.then_some(true),
            accept: constraints.accept.clone(),
            content: field.content().map(String::from),
        }
    }

    /// Rebuild a field; `position` (1-based) names fields that arrive without one.
    pub fn into_field(self, position: u32) -> Result<Field> {
        let field_type: FieldType = self.field_type.parse()?;
        let id = if self.id.trim().is_empty() {
            FieldId::new()
        } else {
            FieldId::from_string(self.id)
        };
        let name = if self.name.trim().is_empty() {
            format!("{}_{}", field_type.as_str(), position)
        } else {
            self.name
        };
        let label = if self.label.trim().is_empty() {
            field_type.default_label().to_string()
        } else {
            self.label
        };

        let mut field = Field::restore(id, field_type, name, label);
        field.placeholder = non_empty(self.placeholder);
        field.required = self.required;
        if field_type.is_choice() {
            field.options = clean_options(self.options.unwrap_or_default());
        }
        field.description = non_empty(self.description);
        field.class_name = non_empty(self.class_name);
        field.value = non_empty(self.value);
        field.default_value = non_empty(self.default_value);
        field.content = non_empty(self.content);
        field.validation = self.validation.unwrap_or_default();
        field.constraints = FieldConstraints {
            min: self.min,
            max: self.max,
            step: self.step,
            rows: self.rows,
            multiple: self.multiple.unwrap_or(false),
            accept: non_empty(self.accept),
        };
        Ok(field)
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => Some(matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "required"
        )),
        _ => None,
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(truthy(&value).unwrap_or(false))
}

fn lenient_opt_bool<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<bool>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(truthy(&value))
}

fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(_) => serde_json::from_value(value).ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_options<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(parse_options_text(&text)),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Object(map) => map
                        .get("label")
                        .or_else(|| map.get("value"))
                        .and_then(Value::as_str)
                        .map(String::from),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}
