//! LIFT Forms CLI
//!
//! Command-line access to the form builder core: fetch and store forms
//! through admin-ajax, preview payloads, and check submissions offline.
//!
//! # Usage
//!
//! ```bash
//! lift-forms forms get 12
//! lift-forms forms save -f contact.json --title "Contact"
//! lift-forms preview -f contact.json --html
//! lift-forms validate -f contact.json --values submission.json
//! lift-forms config set nonce 8f1c2e
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "lift-forms")]
#[command(author = "LIFT Creations")]
#[command(version)]
#[command(about = "LIFT Forms Command Line Interface", long_about = None)]
struct Cli {
    /// admin-ajax endpoint URL
    #[arg(long, env = "LIFT_FORMS_ENDPOINT")]
    endpoint: Option<String>,

    /// Security nonce sent with every request
    #[arg(long, env = "LIFT_FORMS_NONCE")]
    nonce: Option<String>,

    /// Output format
    #[arg(long, short = 'o')]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and store forms
    Forms {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Render a payload file to HTML or a layout summary
    Preview {
        /// Payload file (structured, JSON text, or legacy field array)
        #[arg(short, long)]
        file: String,
        /// Emit canvas HTML instead of the layout table
        #[arg(long)]
        html: bool,
    },
    /// Check submitted values against a payload file
    Validate {
        #[arg(short, long)]
        file: String,
        /// JSON object of field name to value
        #[arg(long)]
        values: String,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum FormCommands {
    /// Load a stored form and list its fields
    Get { id: u64 },
    /// Save a payload file; creates a new form unless --id is given
    Save {
        #[arg(short, long)]
        file: String,
        #[arg(long)]
        id: Option<u64>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Load a stored form and write its payload to a file
    Export {
        id: u64,
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("LIFT Forms CLI v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load_or_default(cli.profile.as_deref());
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(output::OutputFormat::parse))
        .unwrap_or(output::OutputFormat::Table);
    let builder_config = config.builder_config(cli.endpoint, cli.nonce);
    debug!(endpoint = %builder_config.endpoint, ?format, "running command");

    let result = match cli.command {
        Commands::Forms { action } => commands::forms::handle(action, builder_config, format).await,
        Commands::Preview { file, html } => commands::preview::render(&file, html, format),
        Commands::Validate { file, values } => commands::preview::validate(&file, &values, format),
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()),
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}
