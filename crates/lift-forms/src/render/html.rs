//! HTML projection of the canvas tree

use std::fmt::Write;

use super::{ColumnNode, FieldNode, RenderTree, RowControl, RowNode};
use crate::domain::aggregates::LayoutMode;
use crate::domain::value_objects::FieldType;

/// Render the canvas as HTML. Nodes carry `data-*-id` attributes as
/// reconciliation keys.
pub fn to_html(tree: &RenderTree) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div class="lift-form-canvas" data-form-id="{}" data-layout="{}">"#,
        tree.form_id,
        match tree.settings.layout_mode {
            LayoutMode::Flat => "flat",
            LayoutMode::Grid => "grid",
        }
    );
    if tree.rows.is_empty() {
        out.push_str(r#"<div class="lift-canvas-empty">Drag a row layout or a field here to start building your form.</div>"#);
    }
    for row in &tree.rows {
        write_row(&mut out, row);
    }
    out.push_str("</div>");
    out
}

fn write_row(out: &mut String, row: &RowNode) {
    let _ = write!(out, r#"<div class="lift-row" data-row-id="{}" draggable="true">"#, escape(row.key.as_str()));
    if !row.controls.is_empty() {
        out.push_str(r#"<div class="lift-row-controls">"#);
        for control in &row.controls {
            let (action, label) = match control {
                RowControl::AddColumn => ("add-column", "Add column"),
                RowControl::RemoveColumn => ("remove-column", "Remove column"),
                RowControl::Delete => ("delete-row", "Delete row"),
            };
            let _ = write!(out, r#"<button type="button" data-action="{action}" aria-label="{label}"></button>"#);
        }
        out.push_str("</div>");
    }
    for column in &row.columns {
        write_column(out, column);
    }
    out.push_str("</div>");
}

fn write_column(out: &mut String, column: &ColumnNode) {
    let _ = write!(
        out,
        r#"<div class="lift-column" data-column-id="{}" style="flex: {} 1 0%">"#,
        escape(column.key.as_str()),
        column.width_factor
    );
    if column.fields.is_empty() {
        out.push_str(r#"<div class="lift-column-placeholder">Drop fields here</div>"#);
    }
    for field in &column.fields {
        write_field(out, field);
    }
    out.push_str("</div>");
}

fn write_field(out: &mut String, node: &FieldNode) {
    let field = &node.field;
    let name = escape(field.name());
    let label = escape(field.label());
    let required = if field.required() { " required" } else { "" };
    let marker = if field.required() { r#" <span class="required">*</span>"# } else { "" };
    let placeholder = field
        .placeholder()
        .map(|p| format!(r#" placeholder="{}""#, escape(p)))
        .unwrap_or_default();

    let _ = write!(
        out,
        r#"<div class="lift-field" data-field-id="{}" data-field-type="{}" draggable="true">"#,
        escape(node.key.as_str()),
        field.field_type()
    );
    if field.field_type() != FieldType::Hidden {
        let _ = write!(out, r#"<label for="{name}">{label}{marker}</label>"#);
    }

    match field.field_type() {
        FieldType::Textarea => {
            let rows = field.constraints().rows.unwrap_or(4);
            let _ = write!(out, r#"<textarea id="{name}" name="{name}" rows="{rows}"{placeholder}{required}></textarea>"#);
        }
        FieldType::Select => {
            let _ = write!(out, r#"<select id="{name}" name="{name}"{required}>"#);
            for option in field.options() {
                let option = escape(option);
                let _ = write!(out, r#"<option value="{option}">{option}</option>"#);
            }
            out.push_str("</select>");
        }
        FieldType::Radio | FieldType::Checkbox => {
            let kind = field.field_type();
            let suffix = if kind == FieldType::Checkbox { "[]" } else { "" };
            out.push_str(r#"<div class="lift-choices">"#);
            for option in field.options() {
                let option = escape(option);
                let _ = write!(
                    out,
                    r#"<label><input type="{kind}" name="{name}{suffix}" value="{option}"> {option}</label>"#
                );
            }
            out.push_str("</div>");
        }
        FieldType::Hidden => {
            let value = escape(field.value().or(field.default_value()).unwrap_or_default());
            let _ = write!(out, r#"<input type="hidden" name="{name}" value="{value}">"#);
        }
        FieldType::File => {
            let accept = field
                .constraints()
                .accept
                .as_deref()
                .map(|a| format!(r#" accept="{}""#, escape(a)))
                .unwrap_or_default();
            let _ = write!(out, r#"<input type="file" id="{name}" name="{name}"{accept}{required}>"#);
        }
        kind => {
            let _ = write!(out, r#"<input type="{kind}" id="{name}" name="{name}"{placeholder}{required}>"#);
        }
    }

    if let Some(description) = field.description() {
        let _ = write!(out, r#"<p class="lift-field-description">{}</p>"#, escape(description));
    }

    out.push_str(r#"<div class="lift-field-controls">"#);
    for control in &node.controls {
        let _ = write!(
            out,
            r#"<button type="button" data-action="{}" aria-label="{}"></button>"#,
            control.action(),
            control.aria_label()
        );
    }
    out.push_str("</div></div>");
}

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
