//! Domain Events
//!
//! Raised by the `Form` aggregate on every layout or field change.

use chrono::{DateTime, Utc};

use crate::domain::aggregates::Placement;
use crate::domain::value_objects::{ColumnId, FieldId, FieldType, FormId, RowId};

#[derive(Clone, Debug, PartialEq)]
pub enum FormEvent {
    RowAdded { row_id: RowId, columns: usize },
    RowRemoved { row_id: RowId, discarded_fields: usize },
    RowMoved { row_id: RowId, neighbour: RowId, placement: Placement },
    ColumnAdded { row_id: RowId, column_id: ColumnId },
    ColumnRemoved { row_id: RowId, column_id: ColumnId, discarded_fields: usize },
    ColumnResized { column_id: ColumnId, width_factor: f64 },
    FieldAdded { field_id: FieldId, column_id: ColumnId, field_type: FieldType },
    FieldUpdated { field_id: FieldId },
    FieldRemoved { field_id: FieldId },
    FieldMoved { field_id: FieldId, from: ColumnId, to: ColumnId, index: usize },
    Saved { form_id: FormId, at: DateTime<Utc> },
}

impl FormEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            FormEvent::RowAdded { .. } => "row.added",
            FormEvent::RowRemoved { .. } => "row.removed",
            FormEvent::RowMoved { .. } => "row.moved",
            FormEvent::ColumnAdded { .. } => "column.added",
            FormEvent::ColumnRemoved { .. } => "column.removed",
            FormEvent::ColumnResized { .. } => "column.resized",
            FormEvent::FieldAdded { .. } => "field.added",
            FormEvent::FieldUpdated { .. } => "field.updated",
            FormEvent::FieldRemoved { .. } => "field.removed",
            FormEvent::FieldMoved { .. } => "field.moved",
            FormEvent::Saved { .. } => "form.saved",
        }
    }
}
