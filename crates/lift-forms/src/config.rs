//! Builder configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::domain::aggregates::LayoutMode;
use crate::error::{FormsError, Result};

/// Builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// admin-ajax endpoint
    pub endpoint: String,
    /// Security token sent with every mutating request
    pub nonce: String,
    /// Action names understood by the endpoint
    pub actions: AjaxActions,
    /// Seconds between autosaves; zero disables autosave
    pub autosave_interval_secs: u64,
    /// Layout of new forms
    pub layout_mode: LayoutMode,
    /// Client-side upload limit in bytes
    pub max_upload_bytes: Option<u64>,
    pub request_timeout_secs: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost/wp-admin/admin-ajax.php".into(),
            nonce: String::new(),
            actions: AjaxActions::default(),
            autosave_interval_secs: 30,
            layout_mode: LayoutMode::Grid,
            max_upload_bytes: Some(10 * 1024 * 1024),
            request_timeout_secs: 30,
        }
    }
}

/// `action` parameter per request kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AjaxActions {
    pub save: String,
    pub load: String,
    pub upload: String,
    pub signature: String,
}

impl Default for AjaxActions {
    fn default() -> Self {
        Self {
            save: "lift_forms_save".into(),
            load: "lift_forms_get".into(),
            upload: "lift_forms_upload_file".into(),
            signature: "lift_forms_save_signature".into(),
        }
    }
}

impl BuilderConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.request_timeout_secs == 0 {
            return Err(FormsError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint)
            .map_err(|e| FormsError::Config(format!("invalid endpoint {}: {}", self.endpoint, e)))
    }

    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_interval_secs > 0).then(|| Duration::from_secs(self.autosave_interval_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: BuilderConfig =
            serde_json::from_str(r#"{"nonce":"abc","actions":{"save":"custom_save"}}"#).unwrap();
        assert_eq!(config.nonce, "abc");
        assert_eq!(config.actions.save, "custom_save");
        assert_eq!(config.actions.load, "lift_forms_get");
        assert_eq!(config.autosave_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("lift-forms-{}.json", uuid::Uuid::new_v4()));
        let config = BuilderConfig {
            nonce: "n".into(),
            layout_mode: LayoutMode::Flat,
            autosave_interval_secs: 0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = BuilderConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
        assert_eq!(loaded.autosave_interval(), None);
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let config = BuilderConfig { endpoint: "not a url".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(FormsError::Config(_))));
    }
}
