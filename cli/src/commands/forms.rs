//! Form commands against the admin-ajax endpoint

use colored::Colorize;
use lift_forms::{serialize, AjaxBackend, BuilderConfig, FormBuilder, FormId};
use std::sync::Arc;

use crate::output::{field_rows, OutputFormat};
use crate::FormCommands;

fn builder(config: BuilderConfig) -> Result<FormBuilder, String> {
    let backend = AjaxBackend::new(&config).map_err(|e| e.to_string())?;
    Ok(FormBuilder::new(Arc::new(backend), config))
}

pub async fn handle(action: FormCommands, config: BuilderConfig, format: OutputFormat) -> Result<(), String> {
    match action {
        FormCommands::Get { id } => {
            let builder = builder(config)?;
            builder.load(FormId::new(id)).await.map_err(|e| e.to_string())?;
            let form = builder.snapshot();
            eprintln!(
                "{} ({} rows, {} fields)",
                form.title().bold(),
                form.rows().len(),
                form.field_count()
            );
            format.print(&field_rows(&form));
        }
        FormCommands::Save { file, id, title, description } => {
            let form_id = id.map(FormId::new).unwrap_or(FormId::DRAFT);
            let form = super::preview::read_form(&file, form_id, &title, &description)?;
            let backend = AjaxBackend::new(&config).map_err(|e| e.to_string())?;
            let builder = FormBuilder::with_form(Arc::new(backend), config, form);
            let saved = builder.save().await.map_err(|e| e.to_string())?;
            println!("{} form {}", "Saved".green(), saved);
        }
        FormCommands::Export { id, file } => {
            let builder = builder(config)?;
            builder.load(FormId::new(id)).await.map_err(|e| e.to_string())?;
            let payload = serialize(&builder.snapshot());
            let content = serde_json::to_string_pretty(&payload).map_err(|e| e.to_string())?;
            std::fs::write(&file, content).map_err(|e| e.to_string())?;
            println!("{} form {} to {}", "Exported".green(), id, file);
        }
    }
    Ok(())
}
