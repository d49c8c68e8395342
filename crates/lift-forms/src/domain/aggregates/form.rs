//! Form Aggregate
//!
//! Root of the builder model. Owns every field in an id-keyed arena; rows
//! and columns only reference fields by id. The in-memory form is the
//! source of truth, the canvas is a projection of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::aggregates::field::{Field, FieldPatch};
use crate::domain::aggregates::layout::{
    nearest_boundary, Column, Placement, Row, RowBox, MAX_COLUMNS, MIN_COLUMNS,
};
use crate::domain::events::FormEvent;
use crate::domain::value_objects::{ColumnId, FieldId, FieldType, FormId, RowId};
use crate::error::{FormsError, Result};

/// Builder variant: a single flat field list or the row/column grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Flat,
    #[default]
    Grid,
}

/// Confirmation token for operations that discard fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    No,
    Destructive,
}

/// Form-level settings, persisted alongside the fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    pub submit_button_text: String,
    pub success_message: String,
    pub redirect_url: Option<String>,
    pub layout_mode: LayoutMode,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            submit_button_text: "Submit".into(),
            success_message: "Thank you! Your submission has been received.".into(),
            redirect_url: None,
            layout_mode: LayoutMode::Grid,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Form {
    id: FormId,
    title: String,
    description: String,
    settings: FormSettings,
    rows: Vec<Row>,
    fields: HashMap<FieldId, Field>,
    field_seq: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<FormEvent>,
}

impl Form {
    /// Empty, unsaved draft
    pub fn draft(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: FormId::DRAFT,
            title: title.into(),
            description: String::new(),
            settings: FormSettings::default(),
            rows: Vec::new(),
            fields: HashMap::new(),
            field_seq: 0,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: LayoutMode) -> Self {
        self.settings.layout_mode = mode;
        self
    }

    /// Reassemble a form from persisted or rendered parts. Field ids not
    /// referenced by any column are dropped.
    pub(crate) fn restore(
        id: FormId,
        title: String,
        description: String,
        settings: FormSettings,
        rows: Vec<Row>,
        fields: Vec<Field>,
    ) -> Self {
        let mut arena: HashMap<FieldId, Field> =
            fields.into_iter().map(|f| (f.id.clone(), f)).collect();
        let mut owned = HashMap::with_capacity(arena.len());
        let mut rows = rows;
        for row in &mut rows {
            for column in &mut row.columns {
                column.fields.retain(|fid| match arena.remove(fid) {
                    Some(field) => {
                        owned.insert(fid.clone(), field);
                        true
                    }
                    None => false,
                });
            }
        }
        let now = Utc::now();
        Self {
            id,
            title,
            description,
            settings,
            rows,
            field_seq: owned.len() as u32,
            fields: owned,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> FormId { self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> &str { &self.description }
    pub fn settings(&self) -> &FormSettings { &self.settings }
    pub fn mode(&self) -> LayoutMode { self.settings.layout_mode }
    pub fn rows(&self) -> &[Row] { &self.rows }
    pub fn field(&self, id: &FieldId) -> Option<&Field> { self.fields.get(id) }
    pub fn field_count(&self) -> usize { self.fields.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| &r.id == id)
    }

    /// Fields in display and submission order (the legacy flat list)
    pub fn flatten(&self) -> Vec<&Field> {
        self.rows
            .iter()
            .flat_map(|r| r.field_ids())
            .filter_map(|id| self.fields.get(id))
            .collect()
    }

    /// Column currently owning `field`
    pub fn column_of(&self, field: &FieldId) -> Option<&ColumnId> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .find(|c| c.fields.contains(field))
            .map(|c| &c.id)
    }

    /// Row containing `column`
    pub fn row_of_column(&self, column: &ColumnId) -> Option<&RowId> {
        self.locate_column(column).map(|(r, _)| &self.rows[r].id)
    }

    fn locate_column(&self, column: &ColumnId) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(ri, row)| {
            row.columns.iter().position(|c| &c.id == column).map(|ci| (ri, ci))
        })
    }

    fn row_index(&self, row: &RowId) -> Result<usize> {
        self.rows
            .iter()
            .position(|r| &r.id == row)
            .ok_or_else(|| FormsError::RowNotFound(row.to_string()))
    }

    fn name_in_use(&self, name: &str, except: Option<&FieldId>) -> bool {
        self.fields.values().any(|f| f.name == name && Some(&f.id) != except)
    }

    // =========================================================================
    // Form attributes
    // =========================================================================

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch();
    }

    pub fn set_settings(&mut self, settings: FormSettings) {
        self.settings = settings;
        self.touch();
    }

    /// Record the id assigned by the backend on first save
    pub fn adopt_id(&mut self, id: FormId) {
        if self.id != id {
            tracing::debug!(form_id = %id, "adopting backend form id");
            self.id = id;
        }
        self.raise(FormEvent::Saved { form_id: id, at: Utc::now() });
    }

    // =========================================================================
    // Rows and columns
    // =========================================================================

    /// Append a row; `columns` is clamped to 1..=6
    pub fn add_row(&mut self, columns: usize) -> RowId {
        self.insert_row(columns, None)
    }

    /// Insert a row next to `anchor`, or append when there is none
    pub fn insert_row(&mut self, columns: usize, anchor: Option<(&RowId, Placement)>) -> RowId {
        let row = Row::new(columns);
        let row_id = row.id.clone();
        let count = row.columns.len();

        let at = anchor
            .and_then(|(neighbour, placement)| {
                self.rows.iter().position(|r| &r.id == neighbour).map(|n| match placement {
                    Placement::Before => n,
                    Placement::After => n + 1,
                })
            })
            .unwrap_or(self.rows.len());
        self.rows.insert(at, row);

        self.raise(FormEvent::RowAdded { row_id: row_id.clone(), columns: count });
        row_id
    }

    /// Delete a row together with its columns and fields
    pub fn remove_row(&mut self, row_id: &RowId) -> Result<Vec<Field>> {
        let index = self.row_index(row_id)?;
        let row = self.rows.remove(index);
        let discarded: Vec<Field> = row
            .field_ids()
            .filter_map(|id| self.fields.remove(id))
            .collect();

        self.raise(FormEvent::RowRemoved {
            row_id: row_id.clone(),
            discarded_fields: discarded.len(),
        });
        Ok(discarded)
    }

    /// Append a column unless the row already has the maximum
    pub fn add_column(&mut self, row_id: &RowId) -> Result<ColumnId> {
        let index = self.row_index(row_id)?;
        let row = &mut self.rows[index];
        if row.columns.len() >= MAX_COLUMNS {
            return Err(FormsError::ColumnLimit(MAX_COLUMNS));
        }
        let column = Column::new();
        let column_id = column.id.clone();
        row.columns.push(column);

        self.raise(FormEvent::ColumnAdded { row_id: row_id.clone(), column_id: column_id.clone() });
        Ok(column_id)
    }

    /// Remove the last column. Its fields are discarded, not migrated, and
    /// that requires `Confirm::Destructive`.
    pub fn remove_column(&mut self, row_id: &RowId, confirm: Confirm) -> Result<Vec<Field>> {
        let index = self.row_index(row_id)?;
        let row = &mut self.rows[index];
        if row.columns.len() <= MIN_COLUMNS {
            return Err(FormsError::LastColumn);
        }
        if let Some(last) = row.columns.last() {
            if !last.fields.is_empty() && confirm != Confirm::Destructive {
                return Err(FormsError::ConfirmationRequired(last.id.to_string()));
            }
        }
        let column = row.columns.pop().ok_or(FormsError::LastColumn)?;
        let discarded: Vec<Field> = column
            .fields
            .iter()
            .filter_map(|id| self.fields.remove(id))
            .collect();

        self.raise(FormEvent::ColumnRemoved {
            row_id: row_id.clone(),
            column_id: column.id,
            discarded_fields: discarded.len(),
        });
        Ok(discarded)
    }

    /// Relative flex weight; any value is accepted
    pub fn set_column_width(&mut self, column_id: &ColumnId, factor: f64) -> Result<()> {
        let (r, c) = self
            .locate_column(column_id)
            .ok_or_else(|| FormsError::ColumnNotFound(column_id.to_string()))?;
        self.rows[r].columns[c].width_factor = factor;
        self.raise(FormEvent::ColumnResized { column_id: column_id.clone(), width_factor: factor });
        Ok(())
    }

    /// Move a row using the midpoint rule against the rendered row boxes.
    /// Returns whether the row changed position.
    pub fn move_row(&mut self, row_id: &RowId, target_y: f64, boxes: &[RowBox]) -> Result<bool> {
        let current = self.row_index(row_id)?;
        let Some((neighbour, placement)) = nearest_boundary(target_y, boxes, Some(row_id)) else {
            return Ok(false);
        };

        let row = self.rows.remove(current);
        let Some(n) = self.rows.iter().position(|r| r.id == neighbour) else {
            self.rows.insert(current, row);
            return Err(FormsError::RowNotFound(neighbour.to_string()));
        };
        let at = match placement {
            Placement::Before => n,
            Placement::After => n + 1,
        };
        self.rows.insert(at, row);

        if at == current {
            return Ok(false);
        }
        self.raise(FormEvent::RowMoved { row_id: row_id.clone(), neighbour, placement });
        Ok(true)
    }

    // =========================================================================
    // Fields
    // =========================================================================

    /// Create a field of `field_type` at the end of `column_id`
    pub fn add_field(&mut self, column_id: &ColumnId, field_type: FieldType) -> Result<FieldId> {
        self.insert_field(column_id, field_type, None)
    }

    /// Create a field at `index` (end when `None`) of `column_id`
    pub fn insert_field(
        &mut self,
        column_id: &ColumnId,
        field_type: FieldType,
        index: Option<usize>,
    ) -> Result<FieldId> {
        let (r, c) = self
            .locate_column(column_id)
            .ok_or_else(|| FormsError::ColumnNotFound(column_id.to_string()))?;
        Ok(self.place_field(r, c, field_type, index))
    }

    /// Flat-mode append: last column of the last row, creating a one-column
    /// row for an empty form.
    pub fn append_field(&mut self, field_type: FieldType) -> FieldId {
        if self.rows.is_empty() {
            self.add_row(1);
        }
        let r = self.rows.len() - 1;
        let c = self.rows[r].columns.len().saturating_sub(1);
        self.place_field(r, c, field_type, None)
    }

    fn place_field(
        &mut self,
        r: usize,
        c: usize,
        field_type: FieldType,
        index: Option<usize>,
    ) -> FieldId {
        let field = self.create_field(field_type);
        let field_id = field.id.clone();
        let column = &mut self.rows[r].columns[c];
        let column_id = column.id.clone();

        let at = index.unwrap_or(column.fields.len()).min(column.fields.len());
        column.fields.insert(at, field_id.clone());
        self.fields.insert(field_id.clone(), field);

        self.raise(FormEvent::FieldAdded { field_id: field_id.clone(), column_id, field_type });
        field_id
    }

    fn create_field(&mut self, field_type: FieldType) -> Field {
        loop {
            self.field_seq += 1;
            let field = Field::create(field_type, self.field_seq);
            if !self.name_in_use(&field.name, None) {
                return field;
            }
        }
    }

    /// Apply an edit from the edit surface
    pub fn update_field(&mut self, field_id: &FieldId, patch: FieldPatch) -> Result<()> {
        if let Some(name) = patch.name.as_deref().map(str::trim) {
            if !name.is_empty() && self.name_in_use(name, Some(field_id)) {
                return Err(FormsError::DuplicateName(name.to_string()));
            }
        }
        let field = self
            .fields
            .get_mut(field_id)
            .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
        field.apply(patch)?;
        self.raise(FormEvent::FieldUpdated { field_id: field_id.clone() });
        Ok(())
    }

    pub(crate) fn set_field_value(&mut self, field_id: &FieldId, value: String) -> Result<()> {
        let field = self
            .fields
            .get_mut(field_id)
            .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
        field.set_value(value);
        self.raise(FormEvent::FieldUpdated { field_id: field_id.clone() });
        Ok(())
    }

    /// Delete a field wherever it lives
    pub fn remove_field(&mut self, field_id: &FieldId) -> Result<Field> {
        let field = self
            .fields
            .remove(field_id)
            .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
        for column in self.rows.iter_mut().flat_map(|r| r.columns.iter_mut()) {
            column.fields.retain(|f| f != field_id);
        }
        self.raise(FormEvent::FieldRemoved { field_id: field_id.clone() });
        Ok(field)
    }

    /// Transfer a field from one column to another at `index` (end when
    /// `None`). Returns the index it landed on.
    pub fn move_field(
        &mut self,
        field_id: &FieldId,
        from: &ColumnId,
        to: &ColumnId,
        index: Option<usize>,
    ) -> Result<usize> {
        let (fr, fc) = self
            .locate_column(from)
            .ok_or_else(|| FormsError::ColumnNotFound(from.to_string()))?;
        let (tr, tc) = self
            .locate_column(to)
            .ok_or_else(|| FormsError::ColumnNotFound(to.to_string()))?;
        let position = self.rows[fr].columns[fc].position_of(field_id).ok_or_else(|| {
            FormsError::FieldNotInColumn { field: field_id.to_string(), column: from.to_string() }
        })?;

        if from == to && index == Some(position) {
            return Ok(position);
        }

        self.rows[fr].columns[fc].fields.remove(position);
        let slots = &mut self.rows[tr].columns[tc].fields;
        let at = index.unwrap_or(slots.len()).min(slots.len());
        slots.insert(at, field_id.clone());

        self.raise(FormEvent::FieldMoved {
            field_id: field_id.clone(),
            from: from.clone(),
            to: to.clone(),
            index: at,
        });
        Ok(at)
    }

    /// Explicit reorder control of the flat builder. Returns false at the top.
    pub fn move_field_up(&mut self, field_id: &FieldId) -> Result<bool> {
        self.shift_field(field_id, -1)
    }

    /// Explicit reorder control of the flat builder. Returns false at the bottom.
    pub fn move_field_down(&mut self, field_id: &FieldId) -> Result<bool> {
        self.shift_field(field_id, 1)
    }

    fn shift_field(&mut self, field_id: &FieldId, delta: isize) -> Result<bool> {
        let column = self
            .column_of(field_id)
            .cloned()
            .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
        let (r, c) = self
            .locate_column(&column)
            .ok_or_else(|| FormsError::ColumnNotFound(column.to_string()))?;
        let slots = &self.rows[r].columns[c].fields;
        let Some(position) = slots.iter().position(|f| f == field_id) else {
            return Ok(false);
        };
        let target = position as isize + delta;
        if target < 0 || target as usize >= slots.len() {
            return Ok(false);
        }
        self.move_field(field_id, &column, &column, Some(target as usize))?;
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn fields_mut_for_test(&mut self, id: &FieldId) -> Option<&mut Field> {
        self.fields.get_mut(id)
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise(&mut self, event: FormEvent) {
        self.events.push(event);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::draft("")
    }
}
