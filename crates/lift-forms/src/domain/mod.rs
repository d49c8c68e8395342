//! Domain module
//!
//! Fields, rows, columns and the `Form` aggregate that owns them.

pub mod aggregates;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregates::*;
pub use events::*;
pub use value_objects::*;
