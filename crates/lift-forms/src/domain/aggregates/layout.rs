//! Rows and columns
//!
//! Columns hold field ids, never fields, so the layout cannot form cycles.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ColumnId, FieldId, RowId};

pub const MIN_COLUMNS: usize = 1;
pub const MAX_COLUMNS: usize = 6;
pub const DEFAULT_WIDTH_FACTOR: f64 = 1.0;

/// Vertical container for fields inside a row
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub(crate) id: ColumnId,
    pub(crate) width_factor: f64,
    pub(crate) fields: Vec<FieldId>,
}

impl Column {
    pub fn new() -> Self {
        Self::with_id(ColumnId::new())
    }

    pub(crate) fn with_id(id: ColumnId) -> Self {
        Self { id, width_factor: DEFAULT_WIDTH_FACTOR, fields: Vec::new() }
    }

    pub fn id(&self) -> &ColumnId { &self.id }
    pub fn width_factor(&self) -> f64 { self.width_factor }
    pub fn fields(&self) -> &[FieldId] { &self.fields }

    pub fn position_of(&self, field: &FieldId) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }
}

impl Default for Column {
    fn default() -> Self {
        Self::new()
    }
}

/// Horizontal container of 1 to 6 columns
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub(crate) id: RowId,
    pub(crate) columns: Vec<Column>,
}

impl Row {
    /// Create a row; `columns` is clamped to `[MIN_COLUMNS, MAX_COLUMNS]`.
    pub fn new(columns: usize) -> Self {
        let count = columns.clamp(MIN_COLUMNS, MAX_COLUMNS);
        Self {
            id: RowId::new(),
            columns: (0..count).map(|_| Column::new()).collect(),
        }
    }

    pub(crate) fn with_columns(id: RowId, columns: Vec<Column>) -> Self {
        Self { id, columns }
    }

    pub fn id(&self) -> &RowId { &self.id }
    pub fn columns(&self) -> &[Column] { &self.columns }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn field_count(&self) -> usize {
        self.columns.iter().map(|c| c.fields.len()).sum()
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &FieldId> {
        self.columns.iter().flat_map(|c| c.fields.iter())
    }
}

/// Which side of a neighbouring row an insertion lands on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    After,
}

/// Rendered vertical extent of a row
#[derive(Clone, Debug, PartialEq)]
pub struct RowBox {
    pub row_id: RowId,
    pub top: f64,
    pub height: f64,
}

impl RowBox {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Midpoint rule: the row whose midpoint is closest to `y`, and whether `y`
/// falls above (Before) or below (After) it. `exclude` skips the dragged row.
pub fn nearest_boundary(
    y: f64,
    boxes: &[RowBox],
    exclude: Option<&RowId>,
) -> Option<(RowId, Placement)> {
    boxes
        .iter()
        .filter(|b| Some(&b.row_id) != exclude)
        .min_by(|a, b| {
            let da = (y - a.midpoint()).abs();
            let db = (y - b.midpoint()).abs();
            da.total_cmp(&db)
        })
        .map(|b| {
            let placement = if y < b.midpoint() { Placement::Before } else { Placement::After };
            (b.row_id.clone(), placement)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> (Vec<RowBox>, Vec<RowId>) {
        let ids: Vec<RowId> = (0..3).map(|_| RowId::new()).collect();
        let boxes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| RowBox { row_id: id.clone(), top: i as f64 * 100.0, height: 100.0 })
            .collect();
        (boxes, ids)
    }

    #[test]
    fn test_row_clamps_columns() {
        assert_eq!(Row::new(0).columns().len(), 1);
        assert_eq!(Row::new(9).columns().len(), 6);
        assert_eq!(Row::new(3).columns().len(), 3);
        assert!(Row::new(3).columns().iter().all(|c| c.width_factor() == 1.0));
    }

    #[test]
    fn test_nearest_boundary_midpoint() {
        let (boxes, ids) = boxes();
        assert_eq!(nearest_boundary(10.0, &boxes, None), Some((ids[0].clone(), Placement::Before)));
        assert_eq!(nearest_boundary(160.0, &boxes, None), Some((ids[1].clone(), Placement::After)));
        assert_eq!(nearest_boundary(999.0, &boxes, None), Some((ids[2].clone(), Placement::After)));
    }

    #[test]
    fn test_nearest_boundary_excludes_dragged_row() {
        let (boxes, ids) = boxes();
        let found = nearest_boundary(150.0, &boxes, Some(&ids[1]));
        assert!(matches!(found, Some((id, _)) if id != ids[1]));
        assert_eq!(nearest_boundary(0.0, &boxes[..1], Some(&ids[0])), None);
    }
}
