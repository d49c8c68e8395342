//! Drag/drop controller
//!
//! One gesture at a time: `Idle -> Dragging -> terminal outcome -> Idle`.
//! The controller never owns the form. `hover` only reads it to place the
//! drop indicator and `complete` applies the matching layout operation.

use crate::domain::aggregates::{nearest_boundary, Form, Placement, RowBox};
use crate::domain::value_objects::{ColumnId, FieldId, FieldType, RowId};
use crate::error::{FormsError, Result};

/// What is being dragged
#[derive(Clone, Debug, PartialEq)]
pub enum DragSource {
    /// Row layout button of the palette
    PaletteRow { columns: usize },
    /// Field type button of the palette
    PaletteField { field_type: FieldType },
    /// Existing row, by its handle
    CanvasRow { row_id: RowId },
    /// Existing field block
    CanvasField { field_id: FieldId },
}

impl DragSource {
    fn is_row(&self) -> bool {
        matches!(self, DragSource::PaletteRow { .. } | DragSource::CanvasRow { .. })
    }
}

/// Zone under the pointer
#[derive(Clone, Debug, PartialEq)]
pub enum DropTarget {
    /// Upper or lower half of a field block
    Field { field_id: FieldId, placement: Placement },
    /// Column body; `index` is the slot, end when `None`
    Column { column_id: ColumnId, index: Option<usize> },
    /// Row area of the canvas at vertical position `y`
    Row { y: f64 },
    /// Anything the canvas does not recognise
    Outside,
}

/// Visual marker for the current hover position
#[derive(Clone, Debug, PartialEq)]
pub enum DropIndicator {
    RowBoundary { row_id: RowId, placement: Placement },
    /// Empty canvas, the drop appends
    Canvas,
    Column { column_id: ColumnId },
    Field { field_id: FieldId, placement: Placement },
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { source: DragSource, indicator: Option<DropIndicator> },
}

/// Terminal state of a gesture
#[derive(Clone, Debug, PartialEq)]
pub enum DropOutcome {
    DroppedOnField { field_id: FieldId, column_id: ColumnId, index: usize },
    DroppedOnColumn { field_id: FieldId, column_id: ColumnId, index: usize },
    DroppedOnRow { row_id: RowId },
    Cancelled,
}

impl DropOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DropOutcome::Cancelled)
    }
}

/// Resolved insertion point for a field drop
struct Slot {
    column_id: ColumnId,
    index: Option<usize>,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn indicator(&self) -> Option<&DropIndicator> {
        match &self.state {
            DragState::Dragging { indicator, .. } => indicator.as_ref(),
            DragState::Idle => None,
        }
    }

    /// dragstart
    pub fn begin(&mut self, source: DragSource) -> Result<()> {
        if self.is_dragging() {
            return Err(FormsError::DragInProgress);
        }
        tracing::trace!(?source, "drag started");
        self.state = DragState::Dragging { source, indicator: None };
        Ok(())
    }

    /// dragover: recompute the indicator. `None` means the zone rejects the payload.
    pub fn hover(
        &mut self,
        form: &Form,
        target: &DropTarget,
        boxes: &[RowBox],
    ) -> Result<Option<DropIndicator>> {
        let DragState::Dragging { source, indicator } = &mut self.state else {
            return Err(FormsError::NotDragging);
        };
        let next = indicator_for(form, source, target, boxes);
        *indicator = next.clone();
        Ok(next)
    }

    /// dragleave: clear the marker, keep the gesture
    pub fn leave(&mut self) {
        if let DragState::Dragging { indicator, .. } = &mut self.state {
            *indicator = None;
        }
    }

    /// drop event: apply the layout operation for `target`. The controller is back
    /// to `Idle` afterwards whatever the result; a failed operation leaves
    /// the form untouched.
    pub fn complete(&mut self, form: &mut Form, target: DropTarget, boxes: &[RowBox]) -> Result<DropOutcome> {
        let DragState::Dragging { source, .. } = std::mem::take(&mut self.state) else {
            return Err(FormsError::NotDragging);
        };

        if indicator_for(form, &source, &target, boxes).is_none() {
            tracing::debug!(?source, ?target, "drop on invalid target");
            return Ok(DropOutcome::Cancelled);
        }

        let outcome = match (&source, target) {
            (DragSource::PaletteRow { columns }, DropTarget::Row { y }) => {
                let anchor = nearest_boundary(y, boxes, None);
                let row_id = form.insert_row(*columns, anchor.as_ref().map(|(r, p)| (r, *p)));
                DropOutcome::DroppedOnRow { row_id }
            }
            (DragSource::CanvasRow { row_id }, DropTarget::Row { y }) => {
                form.move_row(row_id, y, boxes)?;
                DropOutcome::DroppedOnRow { row_id: row_id.clone() }
            }
            (_, DropTarget::Row { y }) => {
                // A field dropped between rows gets a row of its own
                let anchor = nearest_boundary(y, boxes, None);
                let row_id = form.insert_row(1, anchor.as_ref().map(|(r, p)| (r, *p)));
                let column_id = form
                    .row(&row_id)
                    .and_then(|r| r.columns().first())
                    .map(|c| c.id().clone())
                    .ok_or_else(|| FormsError::RowNotFound(row_id.to_string()))?;
                if let Err(e) = place(form, &source, Slot { column_id, index: None }) {
                    form.remove_row(&row_id)?;
                    return Err(e);
                }
                DropOutcome::DroppedOnRow { row_id }
            }
            (_, DropTarget::Field { field_id, placement }) => {
                let slot = field_slot(form, &source, &field_id, placement)?;
                let (field_id, column_id, index) = place(form, &source, slot)?;
                DropOutcome::DroppedOnField { field_id, column_id, index }
            }
            (_, DropTarget::Column { column_id, index }) => {
                let (field_id, column_id, index) = place(form, &source, Slot { column_id, index })?;
                DropOutcome::DroppedOnColumn { field_id, column_id, index }
            }
            (_, DropTarget::Outside) => DropOutcome::Cancelled,
        };

        tracing::debug!(?outcome, "drop applied");
        Ok(outcome)
    }

    /// dragend. Still dragging here means no drop fired: cancel without mutation.
    pub fn end(&mut self) -> DropOutcome {
        if self.is_dragging() {
            tracing::trace!("drag cancelled");
        }
        self.state = DragState::Idle;
        DropOutcome::Cancelled
    }
}

fn indicator_for(
    form: &Form,
    source: &DragSource,
    target: &DropTarget,
    boxes: &[RowBox],
) -> Option<DropIndicator> {
    match target {
        DropTarget::Outside => None,
        DropTarget::Row { y } => {
            let exclude = match source {
                DragSource::CanvasRow { row_id } => {
                    form.row(row_id)?;
                    Some(row_id)
                }
                DragSource::CanvasField { field_id } => {
                    form.field(field_id)?;
                    None
                }
                _ => None,
            };
            match nearest_boundary(*y, boxes, exclude) {
                Some((row_id, placement)) => Some(DropIndicator::RowBoundary { row_id, placement }),
                None if form.rows().is_empty() => Some(DropIndicator::Canvas),
                None => None,
            }
        }
        _ if source.is_row() => None,
        DropTarget::Column { column_id, .. } => {
            if let DragSource::CanvasField { field_id } = source {
                form.field(field_id)?;
            }
            form.row_of_column(column_id)?;
            Some(DropIndicator::Column { column_id: column_id.clone() })
        }
        DropTarget::Field { field_id, placement } => {
            if let DragSource::CanvasField { field_id: dragged } = source {
                if dragged == field_id {
                    return None;
                }
                form.field(dragged)?;
            }
            form.column_of(field_id)?;
            Some(DropIndicator::Field { field_id: field_id.clone(), placement: *placement })
        }
    }
}

/// Column slot next to `target`. When a field moves down inside its own
/// column, removing it first shifts the slot up by one.
fn field_slot(form: &Form, source: &DragSource, target: &FieldId, placement: Placement) -> Result<Slot> {
    let column_id = form
        .column_of(target)
        .cloned()
        .ok_or_else(|| FormsError::FieldNotFound(target.to_string()))?;
    let column = form
        .row_of_column(&column_id)
        .and_then(|r| form.row(r))
        .and_then(|r| r.column(&column_id))
        .ok_or_else(|| FormsError::ColumnNotFound(column_id.to_string()))?;
    let position = column
        .position_of(target)
        .ok_or_else(|| FormsError::FieldNotFound(target.to_string()))?;

    let mut index = match placement {
        Placement::Before => position,
        Placement::After => position + 1,
    };
    if let DragSource::CanvasField { field_id } = source {
        if let Some(current) = column.position_of(field_id) {
            if current < index {
                index -= 1;
            }
        }
    }
    Ok(Slot { column_id, index: Some(index) })
}

/// Create or move the dragged field into `slot`
fn place(form: &mut Form, source: &DragSource, slot: Slot) -> Result<(FieldId, ColumnId, usize)> {
    match source {
        DragSource::PaletteField { field_type } => {
            let field_id = form.insert_field(&slot.column_id, *field_type, slot.index)?;
            let index = form
                .row_of_column(&slot.column_id)
                .and_then(|r| form.row(r))
                .and_then(|r| r.column(&slot.column_id))
                .and_then(|c| c.position_of(&field_id))
                .unwrap_or_default();
            Ok((field_id, slot.column_id, index))
        }
        DragSource::CanvasField { field_id } => {
            let from = form
                .column_of(field_id)
                .cloned()
                .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
            let index = form.move_field(field_id, &from, &slot.column_id, slot.index)?;
            Ok((field_id.clone(), slot.column_id, index))
        }
        DragSource::PaletteRow { .. } | DragSource::CanvasRow { .. } => {
            Err(FormsError::Config("row payload cannot land in a column".into()))
        }
    }
}
