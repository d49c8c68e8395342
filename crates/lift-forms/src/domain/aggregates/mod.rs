//! Aggregates module

pub mod field;
pub mod form;
pub mod layout;

pub use field::{Field, FieldConstraints, FieldPatch, FieldValidation, OptionsInput};
pub use form::{Confirm, Form, FormSettings, LayoutMode};
pub use layout::{nearest_boundary, Column, Placement, Row, RowBox, MAX_COLUMNS, MIN_COLUMNS};
