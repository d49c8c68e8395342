//! Config commands

use crate::config::Config;
use crate::ConfigCommands;

fn masked(nonce: Option<String>) -> String {
    nonce
        .map(|n| format!("{}****", n.chars().take(4).collect::<String>()))
        .unwrap_or_else(|| "(not set)".into())
}

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<(), String> {
    match action {
        ConfigCommands::Init => {
            let path = Config::default().save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default(profile);
            match key.as_str() {
                "endpoint" => config.endpoint = Some(value),
                "nonce" => config.nonce = Some(value),
                "default_format" => config.default_format = Some(value),
                "request_timeout_secs" => {
                    config.request_timeout_secs =
                        Some(value.parse().map_err(|_| format!("Invalid timeout: {}", value))?)
                }
                _ => return Err(format!("Unknown config key: {}", key)),
            }
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_or_default(profile);
            let value = match key.as_str() {
                "endpoint" => config.endpoint,
                "nonce" => Some(masked(config.nonce)),
                "default_format" => config.default_format,
                "request_timeout_secs" => config.request_timeout_secs.map(|t| t.to_string()),
                _ => return Err(format!("Unknown config key: {}", key)),
            };
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load_or_default(profile);
            println!("endpoint: {}", config.endpoint.unwrap_or_else(|| "(not set)".into()));
            println!("nonce: {}", masked(config.nonce));
            println!("default_format: {}", config.default_format.unwrap_or_else(|| "(not set)".into()));
        }
    }
    Ok(())
}
