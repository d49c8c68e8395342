//! CLI Configuration

use lift_forms::BuilderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub endpoint: Option<String>,
    pub nonce: Option<String>,
    pub default_format: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Profile for a command run: a missing or unreadable file gives defaults
    pub fn load_or_default(profile: Option<&str>) -> Self {
        let path = match Self::config_path(profile) {
            Ok(path) if path.exists() => path,
            _ => return Self::default(),
        };
        match fs::read_to_string(&path) {
            Ok(content) => Self::parse_or_default(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read config, using defaults");
                Self::default()
            }
        }
    }

    fn parse_or_default(content: &str) -> Self {
        toml::from_str(content).unwrap_or_else(|e| {
            warn!(error = %e, "invalid config, using defaults");
            Self::default()
        })
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf, String> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, content).map_err(|e| e.to_string())?;
        Ok(path)
    }

    /// Flags and environment win over the profile file
    pub fn builder_config(&self, endpoint: Option<String>, nonce: Option<String>) -> BuilderConfig {
        let mut config = BuilderConfig::default();
        if let Some(endpoint) = endpoint.or_else(|| self.endpoint.clone()) {
            config.endpoint = endpoint;
        }
        if let Some(nonce) = nonce.or_else(|| self.nonce.clone()) {
            config.nonce = nonce;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        config
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".lift-forms").join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_profile() {
        let config = Config {
            endpoint: Some("https://site.test/wp-admin/admin-ajax.php".into()),
            nonce: Some("from-file".into()),
            ..Default::default()
        };
        let built = config.builder_config(None, Some("from-flag".into()));
        assert_eq!(built.endpoint, "https://site.test/wp-admin/admin-ajax.php");
        assert_eq!(built.nonce, "from-flag");
    }

    #[test]
    fn test_toml_shape() {
        let config: Config = toml::from_str("nonce = \"abc\"\ndefault_format = \"json\"\n").unwrap();
        assert_eq!(config.nonce.as_deref(), Some("abc"));
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let config = Config::parse_or_default("nonce = [unterminated");
        assert_eq!(config.nonce, None);
        assert_eq!(config.builder_config(None, None), BuilderConfig::default());

        let config = Config::parse_or_default("request_timeout_secs = 5\n");
        assert_eq!(config.request_timeout_secs, Some(5));
    }
}
