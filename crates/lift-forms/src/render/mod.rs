//! Canvas renderer
//!
//! Projects a `Form` into a keyed tree of row, column and field nodes. Every
//! node carries its model id so `reconcile` can patch only what changed.
//! `read_back` goes the other way and is reserved for recovering a model
//! that drifted from what the canvas shows.

mod edit;
mod html;
mod reconcile;

pub use edit::EditSurface;
pub use html::to_html;
pub use reconcile::{reconcile, NodeKey, Patch};

use crate::domain::aggregates::{Column, Field, Form, FormSettings, LayoutMode, Row, RowBox, MAX_COLUMNS, MIN_COLUMNS};
use crate::domain::value_objects::{ColumnId, FieldId, FieldType, FormId, RowId};

pub const CANVAS_PADDING: f64 = 20.0;
pub const ROW_GAP: f64 = 16.0;
pub const ROW_PADDING: f64 = 12.0;
pub const FIELD_HEIGHT: f64 = 72.0;
pub const TEXTAREA_HEIGHT: f64 = 120.0;
pub const HIDDEN_HEIGHT: f64 = 40.0;
pub const EMPTY_COLUMN_HEIGHT: f64 = 60.0;

/// Per-field controls shown on the canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Edit,
    Delete,
    MoveUp,
    MoveDown,
}

impl Control {
    pub fn action(&self) -> &'static str {
        match self {
            Control::Edit => "edit",
            Control::Delete => "delete",
            Control::MoveUp => "move-up",
            Control::MoveDown => "move-down",
        }
    }

    pub fn aria_label(&self) -> &'static str {
        match self {
            Control::Edit => "Edit field",
            Control::Delete => "Delete field",
            Control::MoveUp => "Move field up",
            Control::MoveDown => "Move field down",
        }
    }
}

/// Per-row controls shown in grid mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowControl {
    AddColumn,
    RemoveColumn,
    Delete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldNode {
    pub key: FieldId,
    pub field: Field,
    pub height: f64,
    pub controls: Vec<Control>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnNode {
    pub key: ColumnId,
    pub width_factor: f64,
    pub fields: Vec<FieldNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowNode {
    pub key: RowId,
    pub top: f64,
    pub height: f64,
    pub controls: Vec<RowControl>,
    pub columns: Vec<ColumnNode>,
}

/// Live canvas tree
#[derive(Clone, Debug, PartialEq)]
pub struct RenderTree {
    pub form_id: FormId,
    pub title: String,
    pub description: String,
    pub settings: FormSettings,
    pub rows: Vec<RowNode>,
}

impl RenderTree {
    /// Vertical extents used by the midpoint rule
    pub fn row_boxes(&self) -> Vec<RowBox> {
        self.rows
            .iter()
            .map(|r| RowBox { row_id: r.key.clone(), top: r.top, height: r.height })
            .collect()
    }

    pub fn field_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .map(|c| c.fields.len())
            .sum()
    }

    pub fn find_field(&self, id: &FieldId) -> Option<&FieldNode> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .flat_map(|c| c.fields.iter())
            .find(|f| &f.key == id)
    }
}

/// Build the canvas tree for `form`
pub fn render(form: &Form) -> RenderTree {
    let mode = form.mode();
    let mut top = CANVAS_PADDING;
    let rows = form
        .rows()
        .iter()
        .map(|row| {
            let node = render_row(form, row, mode, top);
            top += node.height + ROW_GAP;
            node
        })
        .collect();

    RenderTree {
        form_id: form.id(),
        title: form.title().to_string(),
        description: form.description().to_string(),
        settings: form.settings().clone(),
        rows,
    }
}

fn render_row(form: &Form, row: &Row, mode: LayoutMode, top: f64) -> RowNode {
    let columns: Vec<ColumnNode> = row.columns().iter().map(|c| render_column(form, c, mode)).collect();

    let tallest = columns
        .iter()
        .map(|c| {
            if c.fields.is_empty() {
                EMPTY_COLUMN_HEIGHT
            } else {
                c.fields.iter().map(|f| f.height).sum()
            }
        })
        .fold(EMPTY_COLUMN_HEIGHT, f64::max);

    let mut controls = Vec::new();
    if mode == LayoutMode::Grid {
        if columns.len() < MAX_COLUMNS {
            controls.push(RowControl::AddColumn);
        }
        if columns.len() > MIN_COLUMNS {
            controls.push(RowControl::RemoveColumn);
        }
        controls.push(RowControl::Delete);
    }

    RowNode {
        key: row.id().clone(),
        top,
        height: tallest + ROW_PADDING * 2.0,
        controls,
        columns,
    }
}

fn render_column(form: &Form, column: &Column, mode: LayoutMode) -> ColumnNode {
    let count = column.fields().len();
    let fields = column
        .fields()
        .iter()
        .enumerate()
        .filter_map(|(i, id)| form.field(id).map(|f| (i, f)))
        .map(|(i, field)| {
            let mut controls = vec![Control::Edit, Control::Delete];
            if mode == LayoutMode::Flat {
                if i > 0 {
                    controls.push(Control::MoveUp);
                }
                if i + 1 < count {
                    controls.push(Control::MoveDown);
                }
            }
            FieldNode {
                key: field.id().clone(),
                height: block_height(field.field_type()),
                field: field.clone(),
                controls,
            }
        })
        .collect();

    ColumnNode { key: column.id().clone(), width_factor: column.width_factor(), fields }
}

fn block_height(field_type: FieldType) -> f64 {
    match field_type {
        FieldType::Textarea => TEXTAREA_HEIGHT,
        FieldType::Hidden => HIDDEN_HEIGHT,
        _ => FIELD_HEIGHT,
    }
}

/// Rebuild a form strictly from what the canvas shows.
pub fn read_back(tree: &RenderTree) -> Form {
    let mut fields = Vec::new();
    let rows = tree
        .rows
        .iter()
        .map(|row| {
            let columns = row
                .columns
                .iter()
                .map(|col| {
                    let mut column = Column::with_id(col.key.clone());
                    column.width_factor = col.width_factor;
                    for node in &col.fields {
                        column.fields.push(node.key.clone());
                        fields.push(node.field.clone());
                    }
                    column
                })
                .collect();
            Row::with_columns(row.key.clone(), columns)
        })
        .collect();

    Form::restore(
        tree.form_id,
        tree.title.clone(),
        tree.description.clone(),
        tree.settings.clone(),
        rows,
        fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Form {
        let mut form = Form::draft("Enquiry");
        let row = form.add_row(2);
        let cols: Vec<_> = form.row(&row).unwrap().columns().iter().map(|c| c.id().clone()).collect();
        form.add_field(&cols[0], FieldType::Text).unwrap();
        form.add_field(&cols[0], FieldType::Textarea).unwrap();
        form.add_field(&cols[1], FieldType::Select).unwrap();
        form.add_row(1);
        form
    }

    #[test]
    fn test_render_keys_and_geometry() {
        let form = sample();
        let tree = render(&form);
        assert_eq!(tree.rows.len(), 2);
        assert_eq!(tree.field_count(), 3);
        assert_eq!(tree.rows[0].key, form.rows()[0].id().clone());

        let first = &tree.rows[0];
        assert_eq!(first.top, CANVAS_PADDING);
        assert_eq!(first.height, FIELD_HEIGHT + TEXTAREA_HEIGHT + ROW_PADDING * 2.0);
        let second = &tree.rows[1];
        assert_eq!(second.top, first.top + first.height + ROW_GAP);
        assert_eq!(second.height, EMPTY_COLUMN_HEIGHT + ROW_PADDING * 2.0);
    }

    #[test]
    fn test_flat_mode_controls() {
        let mut form = Form::draft("").with_mode(LayoutMode::Flat);
        form.append_field(FieldType::Text);
        form.append_field(FieldType::Email);
        let tree = render(&form);
        let fields = &tree.rows[0].columns[0].fields;
        assert_eq!(fields[0].controls, vec![Control::Edit, Control::Delete, Control::MoveDown]);
        assert_eq!(fields[1].controls, vec![Control::Edit, Control::Delete, Control::MoveUp]);
        assert!(tree.rows[0].controls.is_empty());
    }

    #[test]
    fn test_read_back_restores_model() {
        let form = sample();
        let restored = read_back(&render(&form));
        assert_eq!(restored.rows(), form.rows());
        assert_eq!(restored.field_count(), 3);
        let names: Vec<_> = restored.flatten().iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["text_1", "textarea_2", "select_3"]);
    }
}
