//! Offline preview and submission checks

use colored::Colorize;
use lift_forms::domain::aggregates::FormSettings;
use lift_forms::domain::services::{validate_submission, SubmittedValue};
use lift_forms::render::to_html;
use lift_forms::{parse_form_data, render as render_tree, Form, FormId};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tabled::Tabled;

use crate::output::{field_rows, OutputFormat};

/// Read a payload file. Content that is not JSON is handed over as text,
/// which the parser then rejects.
pub fn read_form(path: &str, id: FormId, title: &str, description: &str) -> Result<Form, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    let raw = serde_json::from_str::<Value>(&content).unwrap_or(Value::String(content));
    let payload = parse_form_data(&raw).ok_or_else(|| format!("{}: not a form payload", path))?;
    Ok(payload.into_form(id, title, description, FormSettings::default()))
}

pub fn render(path: &str, html: bool, format: OutputFormat) -> Result<(), String> {
    let form = read_form(path, FormId::DRAFT, "", "")?;
    if html {
        println!("{}", to_html(&render_tree(&form)));
    } else {
        format.print(&field_rows(&form));
    }
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct ErrorRow {
    field: String,
    message: String,
}

fn submitted(value: Value) -> Option<SubmittedValue> {
    match value {
        Value::String(s) => Some(SubmittedValue::Text(s)),
        Value::Number(n) => Some(SubmittedValue::Text(n.to_string())),
        Value::Bool(b) => Some(SubmittedValue::Text(if b { "1".into() } else { String::new() })),
        Value::Array(items) => Some(SubmittedValue::Many(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
        )),
        Value::Object(map) => {
            let file_name = map.get("file_name").and_then(Value::as_str)?.to_string();
            let size = map.get("size").and_then(Value::as_u64).unwrap_or(0);
            Some(SubmittedValue::File { file_name, size })
        }
        Value::Null => None,
    }
}

pub fn validate(path: &str, values_path: &str, format: OutputFormat) -> Result<(), String> {
    let form = read_form(path, FormId::DRAFT, "", "")?;
    let content = std::fs::read_to_string(values_path).map_err(|e| format!("{}: {}", values_path, e))?;
    let Value::Object(map) = serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())? else {
        return Err(format!("{}: expected a JSON object", values_path));
    };
    let values: HashMap<String, SubmittedValue> = map
        .into_iter()
        .filter_map(|(name, value)| submitted(value).map(|v| (name, v)))
        .collect();

    let errors = validate_submission(&form, &values);
    if errors.is_empty() {
        println!("{}", "Submission is valid".green());
        return Ok(());
    }
    let rows: Vec<ErrorRow> = errors
        .into_iter()
        .map(|e| ErrorRow { field: e.field_name, message: e.kind.to_string() })
        .collect();
    format.print(&rows);
    Err(format!("{} field(s) failed validation", rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submitted_shapes() {
        assert_eq!(submitted(json!("a")), Some(SubmittedValue::Text("a".into())));
        assert_eq!(
            submitted(json!(["x", null, 2])),
            Some(SubmittedValue::Many(vec!["x".into(), "2".into()]))
        );
        assert_eq!(
            submitted(json!({ "file_name": "cv.pdf", "size": 10 })),
            Some(SubmittedValue::File { file_name: "cv.pdf".into(), size: 10 })
        );
        assert_eq!(submitted(Value::Null), None);
    }
}
