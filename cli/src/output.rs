//! Output formatting

use clap::ValueEnum;
use lift_forms::Form;
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }

    pub fn print<T: Serialize + Tabled>(&self, data: &[T]) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Table => {
                println!("{}", Table::new(data));
            }
        }
    }
}

/// One line per field in display order
#[derive(Debug, Serialize, Tabled)]
pub struct FieldRow {
    pub row: usize,
    pub column: usize,
    pub name: String,
    #[tabled(rename = "type")]
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
}

pub fn field_rows(form: &Form) -> Vec<FieldRow> {
    let mut rows = Vec::with_capacity(form.field_count());
    for (r, row) in form.rows().iter().enumerate() {
        for (c, column) in row.columns().iter().enumerate() {
            for field in column.fields().iter().filter_map(|id| form.field(id)) {
                rows.push(FieldRow {
                    row: r + 1,
                    column: c + 1,
                    name: field.name().to_string(),
                    field_type: field.field_type().to_string(),
                    label: field.label().to_string(),
                    required: field.required(),
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use lift_forms::FieldType;

    #[test]
    fn test_field_rows_follow_layout() {
        let mut form = Form::draft("");
        let row = form.add_row(2);
        let second = form.row(&row).unwrap().columns()[1].id().clone();
        form.add_field(&second, FieldType::Email).unwrap();
        let rows = field_rows(&form);
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].row, rows[0].column), (1, 2));
        assert_eq!(rows[0].field_type, "email");
    }

    #[test]
    fn test_parse_format() {
        assert!(matches!(OutputFormat::parse("YAML"), Some(OutputFormat::Yaml)));
        assert!(OutputFormat::parse("xml").is_none());
    }
}
