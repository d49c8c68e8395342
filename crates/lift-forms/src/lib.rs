//! LIFT Forms Builder Core
//!
//! Client-side model of the LIFT Forms drag-and-drop builder: the form is a
//! tree of rows, columns and fields that the canvas projects and the backend
//! persists.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          FORM BUILDER                                │
//! │                                                                      │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────────┐  │
//! │  │  Drag/Drop   │──▶│    Form      │──▶│        Renderer          │  │
//! │  │  Controller  │   │  Aggregate   │   │ (keyed tree, reconcile)  │  │
//! │  └──────────────┘   └──────┬───────┘   └──────────────────────────┘  │
//! │                            │                                         │
//! │                     ┌──────▼───────┐   ┌──────────────────────────┐  │
//! │                     │ Persistence  │──▶│  FormBackend (port)      │  │
//! │                     │   Bridge     │   │  admin-ajax / in-memory  │  │
//! │                     └──────────────┘   └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Domain Layer**: fields, rows, columns, the `Form` aggregate, events,
//!   submission validation
//! - **Application Layer**: `FormBuilder`, the single owner of the form
//! - **Ports Layer**: the `FormBackend` trait
//! - **Infrastructure Layer**: `AjaxBackend` (reqwest) and an in-memory backend

#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod dnd;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod persistence;
pub mod ports;
pub mod render;
pub mod signature;

pub use application::FormBuilder;
pub use config::{AjaxActions, BuilderConfig};
pub use dnd::{DragController, DragSource, DropIndicator, DropOutcome, DropTarget};
pub use domain::aggregates::{Column, Confirm, Field, FieldPatch, Form, LayoutMode, Row};
pub use domain::events::FormEvent;
pub use domain::value_objects::{ColumnId, FieldId, FieldType, FormId, RowId};
pub use error::{FormsError, Result};
pub use infrastructure::{AjaxBackend, InMemoryFormBackend};
pub use persistence::{parse_form_data, serialize, Payload};
pub use ports::outbound::{BackendError, FormBackend};
pub use render::{read_back, reconcile, render, RenderTree};
pub use signature::SignaturePad;
