//! Value Objects module
//!
//! Identifiers and field type metadata.

pub mod field_type;
pub mod options;

pub use field_type::FieldType;
pub use options::{options_to_text, parse_options_text};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Allocate a fresh identifier
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "_{}"), uuid::Uuid::new_v4().simple()))
            }

            /// Wrap an existing identifier
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Field identifier, unique within a form
    FieldId,
    "field"
);
entity_id!(
    /// Column identifier
    ColumnId,
    "col"
);
entity_id!(
    /// Row identifier
    RowId,
    "row"
);

/// Backend-assigned form identifier. Zero marks an unsaved draft.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FormId(u64);

impl FormId {
    pub const DRAFT: FormId = FormId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_draft(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// WordPress hands ids back as numbers or numeric strings depending on the handler.
impl<'de> Deserialize<'de> for FormId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
            Null(()),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(FormId(n)),
            Raw::Text(s) if s.trim().is_empty() => Ok(FormId::DRAFT),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(FormId)
                .map_err(|_| serde::de::Error::custom(format!("invalid form id: {s}"))),
            Raw::Null(()) => Ok(FormId::DRAFT),
        }
    }
}
