//! Persistence bridge
//!
//! Flattens the form into the transport payload sent as the `fields`
//! parameter of the save request, and rebuilds forms from whatever the load
//! endpoint returns. The payload lists every field once, in display order,
//! plus the row/column layout by id. A legacy flat array of fields is
//! accepted on load and becomes a single one-column row.

mod field;

pub use field::SerializedField;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::domain::aggregates::{Column, Field, Form, FormSettings, Row, MAX_COLUMNS};
use crate::domain::value_objects::{ColumnId, FieldId, FormId, RowId};

/// Transport payload
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub layout: Vec<SerializedRow>,
    #[serde(default)]
    pub fields: Vec<SerializedField>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedRow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub columns: Vec<SerializedColumn>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedColumn {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_width")]
    pub width: f64,
    /// Field ids in order
    #[serde(default)]
    pub fields: Vec<String>,
}

fn default_width() -> f64 {
    1.0
}

/// Why a field was left out of the payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldRejection {
    #[error("missing id")]
    MissingId,
    #[error("missing name")]
    MissingName,
    #[error("choice field without options")]
    NoOptions,
}

/// Check the minimum a field needs to be persisted
pub fn check_field(field: &Field) -> Result<(), FieldRejection> {
    if field.id().is_empty() {
        return Err(FieldRejection::MissingId);
    }
    if field.name().trim().is_empty() {
        return Err(FieldRejection::MissingName);
    }
    if !field.has_valid_options() {
        return Err(FieldRejection::NoOptions);
    }
    Ok(())
}

/// Flatten `form` into a payload. Fields that fail [`check_field`] are
/// dropped with a warning instead of failing the save.
pub fn serialize(form: &Form) -> Payload {
    let mut fields = Vec::with_capacity(form.field_count());
    let mut layout = Vec::with_capacity(form.rows().len());
    let mut order = 0u32;

    for row in form.rows() {
        let mut columns = Vec::with_capacity(row.columns().len());
        for column in row.columns() {
            let mut kept = Vec::with_capacity(column.fields().len());
            for id in column.fields() {
                let Some(field) = form.field(id) else { continue };
                match check_field(field) {
                    Ok(()) => {
                        fields.push(SerializedField::from_field(field, order));
                        kept.push(id.to_string());
                        order += 1;
                    }
                    Err(reason) => {
                        tracing::warn!(
                            field_id = %id,
                            name = field.name(),
                            %reason,
                            "dropping invalid field from payload"
                        );
                    }
                }
            }
            columns.push(SerializedColumn {
                id: column.id().to_string(),
                width: column.width_factor(),
                fields: kept,
            });
        }
        layout.push(SerializedRow { id: row.id().to_string(), columns });
    }

    Payload { layout, fields }
}

/// Interpret raw `form_data`: either already structured, or JSON text that
/// needs an explicit parse (possibly encoded more than once). `None` when it
/// cannot be understood.
pub fn parse_form_data(raw: &Value) -> Option<Payload> {
    match raw {
        Value::Null => Some(Payload::default()),
        Value::String(text) if text.trim().is_empty() => Some(Payload::default()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(inner) => parse_form_data(&inner),
            Err(e) => {
                tracing::warn!(error = %e, "form data is not valid JSON");
                None
            }
        },
        Value::Array(items) => Some(Payload { layout: Vec::new(), fields: parse_fields(items) }),
        Value::Object(map) if map.contains_key("fields") || map.contains_key("layout") => {
            let fields = match map.get("fields") {
                Some(Value::Array(items)) => parse_fields(items),
                Some(nested @ Value::String(_)) => parse_form_data(nested)?.fields,
                _ => Vec::new(),
            };
            let layout = match map.get("layout") {
                Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "ignoring malformed layout");
                    Vec::new()
                }),
                None => Vec::new(),
            };
            Some(Payload { layout, fields })
        }
        _ => None,
    }
}

fn parse_fields(items: &[Value]) -> Vec<SerializedField> {
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<SerializedField>(item.clone()) {
            Ok(field) => Some(field),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed field record");
                None
            }
        })
        .collect()
}

/// Lenient parse of the settings parameter; unknown shapes fall back to defaults
pub fn parse_settings(raw: &Value) -> FormSettings {
    match raw {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map(|v| parse_settings(&v))
            .unwrap_or_default(),
        Value::Object(_) => serde_json::from_value(raw.clone()).unwrap_or_default(),
        _ => FormSettings::default(),
    }
}

impl Payload {
    /// Rebuild a form. Fields the layout does not place are appended as a
    /// one-column row in payload order.
    pub fn into_form(
        self,
        id: FormId,
        title: impl Into<String>,
        description: impl Into<String>,
        settings: FormSettings,
    ) -> Form {
        let mut ordered: Vec<(u32, Field)> = Vec::with_capacity(self.fields.len());
        let mut seen = HashSet::new();
        for (position, record) in self.fields.into_iter().enumerate() {
            let order = record.order.unwrap_or(position as u32);
            match record.into_field(position as u32 + 1) {
                Ok(field) if seen.insert(field.id().clone()) => ordered.push((order, field)),
                Ok(field) => tracing::warn!(field_id = %field.id(), "duplicate field id in payload"),
                Err(e) => tracing::warn!(error = %e, "skipping field record"),
            }
        }
        ordered.sort_by_key(|(order, _)| *order);

        let known: HashSet<&FieldId> = ordered.iter().map(|(_, f)| f.id()).collect();
        let mut placed: HashSet<FieldId> = HashSet::new();
        let mut rows: Vec<Row> = Vec::with_capacity(self.layout.len() + 1);

        for record in self.layout {
            let mut columns: Vec<Column> = Vec::with_capacity(record.columns.len().max(1));
            for col in record.columns {
                let ids: Vec<FieldId> = col
                    .fields
                    .into_iter()
                    .map(FieldId::from_string)
                    .filter(|fid| known.contains(fid) && placed.insert(fid.clone()))
                    .collect();

                if columns.len() == MAX_COLUMNS {
                    // Overflow columns collapse into the last one
                    if let Some(last) = columns.last_mut() {
                        last.fields.extend(ids);
                    }
                    continue;
                }
                let column_id = if col.id.trim().is_empty() {
                    ColumnId::new()
                } else {
                    ColumnId::from_string(col.id)
                };
                let mut column = Column::with_id(column_id);
                column.width_factor = col.width;
                column.fields = ids;
                columns.push(column);
            }
            if columns.is_empty() {
                columns.push(Column::new());
            }
            let row_id = if record.id.trim().is_empty() {
                RowId::new()
            } else {
                RowId::from_string(record.id)
            };
            rows.push(Row::with_columns(row_id, columns));
        }

        let unplaced: Vec<FieldId> = ordered
            .iter()
            .map(|(_, f)| f.id().clone())
            .filter(|fid| !placed.contains(fid))
            .collect();
        if !unplaced.is_empty() {
            let mut column = Column::new();
            column.fields = unplaced;
            rows.push(Row::with_columns(RowId::new(), vec![column]));
        }

        Form::restore(
            id,
            title.into(),
            description.into(),
            settings,
            rows,
            ordered.into_iter().map(|(_, f)| f).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{FieldPatch, OptionsInput};
    use crate::domain::value_objects::FieldType;
    use serde_json::json;

    #[test]
    fn test_email_field_in_middle_column() {
        let mut form = Form::draft("Signup");
        let row = form.add_row(3);
        let col = form.row(&row).unwrap().columns()[1].id().clone();
        let id = form.add_field(&col, FieldType::Email).unwrap();
        form.update_field(&id, FieldPatch { name: Some("email_1".into()), ..Default::default() })
            .unwrap();

        let payload = serialize(&form);
        assert_eq!(payload.fields.len(), 1);
        let value = serde_json::to_value(&payload.fields[0]).unwrap();
        assert_eq!(value["type"], "email");
        assert_eq!(value["name"], "email_1");
        assert_eq!(value["required"], false);
        assert!(value.get("options").is_none());
        assert_eq!(payload.layout[0].columns[1].fields, vec![id.to_string()]);
    }

    #[test]
    fn test_choice_without_options_dropped() {
        let mut form = Form::draft("");
        let select = form.append_field(FieldType::Select);
        form.append_field(FieldType::Text);
        // Bypass the edit surface guard, as a corrupted load would
        if let Some(field) = form.fields_mut_for_test(&select) {
            field.options.clear();
        }

        let payload = serialize(&form);
        assert_eq!(payload.fields.len(), 1);
        assert_eq!(payload.fields[0].field_type, "text");
        assert!(payload.layout[0].columns[0].fields.iter().all(|f| f != select.as_str()));
    }

    #[test]
    fn test_non_choice_never_carries_options() {
        let mut form = Form::draft("");
        let id = form.append_field(FieldType::Number);
        form.update_field(
            &id,
            FieldPatch { options: Some(OptionsInput::List(vec!["x".into()])), ..Default::default() },
        )
        .unwrap();
        let value = serde_json::to_value(serialize(&form)).unwrap();
        assert!(value["fields"][0].get("options").is_none());
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let mut form = Form::draft("");
        let row = form.add_row(2);
        let cols: Vec<_> = form.row(&row).unwrap().columns().iter().map(|c| c.id().clone()).collect();
        form.add_field(&cols[0], FieldType::Radio).unwrap();
        form.add_field(&cols[1], FieldType::Date).unwrap();
        let a = serde_json::to_string(&serialize(&form)).unwrap();
        let b = serde_json::to_string(&serialize(&form)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_not_json_is_none() {
        assert!(parse_form_data(&json!("not-json")).is_none());
        assert_eq!(parse_form_data(&json!("")), Some(Payload::default()));
    }

    #[test]
    fn test_string_and_structured_agree() {
        let structured = json!({
            "layout": [{ "id": "row_a", "columns": [{ "id": "col_a", "width": 2.0, "fields": ["f1"] }] }],
            "fields": [{ "id": "f1", "type": "text", "name": "first_name", "label": "First name" }]
        });
        let text = Value::String(structured.to_string());
        let double = Value::String(text.to_string());
        let a = parse_form_data(&structured).unwrap();
        assert_eq!(parse_form_data(&text).unwrap(), a);
        assert_eq!(parse_form_data(&double).unwrap(), a);
    }

    #[test]
    fn test_legacy_flat_array() {
        let raw = json!([
            { "id": "a", "type": "text", "name": "first", "label": "First" },
            { "id": "b", "type": "select", "name": "pick", "label": "Pick", "options": ["X", "Y"] },
            { "id": "c", "type": "bogus", "name": "zzz", "label": "?" }
        ]);
        let form = parse_form_data(&raw)
            .unwrap()
            .into_form(FormId::new(5), "Legacy", "", FormSettings::default());
        assert_eq!(form.id().value(), 5);
        assert_eq!(form.rows().len(), 1);
        assert_eq!(form.rows()[0].columns().len(), 1);
        let names: Vec<_> = form.flatten().iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["first", "pick"]);
    }

    #[test]
    fn test_round_trip_preserves_layout() {
        let mut form = Form::draft("Round");
        let row = form.add_row(2);
        let cols: Vec<_> = form.row(&row).unwrap().columns().iter().map(|c| c.id().clone()).collect();
        form.add_field(&cols[1], FieldType::Checkbox).unwrap();
        form.set_column_width(&cols[0], 2.0).unwrap();
        form.add_row(1);

        let rebuilt = serialize(&form).into_form(FormId::new(9), "Round", "", FormSettings::default());
        assert_eq!(rebuilt.rows(), form.rows());
        assert_eq!(serialize(&rebuilt), serialize(&form));
    }

    #[test]
    fn test_overflow_columns_collapse() {
        let columns: Vec<Value> = (0..8)
            .map(|i| json!({ "id": format!("c{i}"), "fields": [format!("f{i}")] }))
            .collect();
        let fields: Vec<Value> = (0..8)
            .map(|i| json!({ "id": format!("f{i}"), "type": "text", "name": format!("n{i}"), "label": "L" }))
            .collect();
        let raw = json!({ "layout": [{ "id": "r", "columns": columns }], "fields": fields });
        let form = parse_form_data(&raw).unwrap().into_form(FormId::DRAFT, "", "", FormSettings::default());
        assert_eq!(form.rows()[0].columns().len(), MAX_COLUMNS);
        assert_eq!(form.field_count(), 8);
        assert_eq!(form.rows()[0].columns()[5].fields().len(), 3);
    }

    #[test]
    fn test_parse_settings_lenient() {
        let s = parse_settings(&json!("{\"submit_button_text\":\"Send\"}"));
        assert_eq!(s.submit_button_text, "Send");
        assert_eq!(parse_settings(&json!(42)), FormSettings::default());
    }
}
