//! Outbound ports
//!
//! The remote endpoint that stores forms, uploaded files and signatures.
//! Infrastructure provides the admin-ajax implementation and an in-memory
//! one for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::value_objects::FormId;

/// Save request as posted to the save endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub form_id: FormId,
    pub name: String,
    pub description: String,
    /// JSON text of the serialized payload
    pub fields: String,
    /// JSON text of the form settings
    pub settings: String,
}

impl SaveRequest {
    /// Form-encoded parameters, without action and nonce
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("form_id", self.form_id.to_string()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("fields", self.fields.clone()),
            ("settings", self.settings.clone()),
        ]
    }
}

/// Raw load response. `form_data` may be structured JSON or JSON text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedForm {
    pub form_data: Value,
    pub form_title: String,
    pub form_description: String,
    pub form_settings: Value,
}

/// File picked for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Stored upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub url: String,
    pub size: u64,
}

/// Upload progress callback, called with a fraction in `[0, 1]`
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Form storage port
#[async_trait]
pub trait FormBackend: Send + Sync {
    /// Store the form; returns the persisted id
    async fn save_form(&self, request: SaveRequest) -> Result<FormId, BackendError>;

    /// Fetch a stored form
    async fn load_form(&self, form_id: FormId) -> Result<LoadedForm, BackendError>;

    /// Upload a file for a file field
    async fn upload_file(
        &self,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<UploadedFile, BackendError>;

    /// Store a signature image given as a data URI; returns its URL
    async fn save_signature(&self, data_uri: String) -> Result<String, BackendError>;
}

/// Backend failure. A missing or stale nonce shows up as `Rejected`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// Request never got a usable HTTP response
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered `success: false`
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Response body could not be understood
    #[error("malformed response: {0}")]
    Malformed(String),
}
