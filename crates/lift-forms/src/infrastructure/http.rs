//! admin-ajax backend
//!
//! Every request is a POST to the single ajax endpoint carrying `action`
//! and `nonce`. Responses use the `{success, data}` envelope; a bare `0` or
//! `-1` body is how WordPress reports an unknown action or a bad nonce.

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::{AjaxActions, BuilderConfig};
use crate::domain::value_objects::FormId;
use crate::error::{FormsError, Result};
use crate::ports::outbound::{
    BackendError, FormBackend, LoadedForm, ProgressFn, SaveRequest, UploadFile, UploadedFile,
};

#[derive(Debug, Deserialize)]
struct AjaxEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct SaveData {
    form_id: FormId,
}

#[derive(Debug, Deserialize)]
struct LoadData {
    #[serde(default)]
    form_data: Value,
    #[serde(default)]
    form_title: Option<String>,
    #[serde(default)]
    form_description: Option<String>,
    #[serde(default)]
    form_settings: Value,
}

/// HTTP backend for the WordPress admin-ajax endpoint
#[derive(Clone)]
pub struct AjaxBackend {
    http: reqwest::Client,
    endpoint: Url,
    nonce: String,
    actions: AjaxActions,
}

impl AjaxBackend {
    pub fn new(config: &BuilderConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("lift-forms/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FormsError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            nonce: config.nonce.clone(),
            actions: config.actions.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(
        &self,
        action: &str,
        params: Vec<(&'static str, String)>,
    ) -> std::result::Result<Value, BackendError> {
        let mut form: Vec<(&str, String)> = Vec::with_capacity(params.len() + 2);
        form.push(("action", action.to_string()));
        form.push(("nonce", self.nonce.clone()));
        form.extend(params);

        tracing::debug!(action, endpoint = %self.endpoint, "posting ajax request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await
            .map_err(transport)?;
        read_envelope(response).await
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

async fn read_envelope(response: reqwest::Response) -> std::result::Result<Value, BackendError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    let trimmed = body.trim();

    if trimmed == "0" || trimmed == "-1" {
        return Err(BackendError::Rejected("invalid nonce or unknown action".into()));
    }

    let envelope: AjaxEnvelope = match serde_json::from_str(trimmed) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(BackendError::Transport(format!("HTTP {}", status)));
        }
        Err(e) => return Err(BackendError::Malformed(e.to_string())),
    };

    if envelope.success {
        Ok(envelope.data)
    } else {
        Err(BackendError::Rejected(error_message(&envelope.data)))
    }
}

fn error_message(data: &Value) -> String {
    match data {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string(),
        _ => "request failed".to_string(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> std::result::Result<T, BackendError> {
    serde_json::from_value(data).map_err(|e| BackendError::Malformed(e.to_string()))
}

fn lenient_size(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl FormBackend for AjaxBackend {
    async fn save_form(&self, request: SaveRequest) -> std::result::Result<FormId, BackendError> {
        let data = self.post(&self.actions.save, request.to_params()).await?;
        let saved: SaveData = decode(data)?;
        Ok(saved.form_id)
    }

    async fn load_form(&self, form_id: FormId) -> std::result::Result<LoadedForm, BackendError> {
        let data = self
            .post(&self.actions.load, vec![("form_id", form_id.to_string())])
            .await?;
        let loaded: LoadData = decode(data)?;
        Ok(LoadedForm {
            form_data: loaded.form_data,
            form_title: loaded.form_title.unwrap_or_default(),
            form_description: loaded.form_description.unwrap_or_default(),
            form_settings: loaded.form_settings,
        })
    }

    // reqwest without the `stream` feature cannot report partial progress,
    // so the callback sees the start and the end of the transfer.
    async fn upload_file(
        &self,
        file: UploadFile,
        progress: ProgressFn,
    ) -> std::result::Result<UploadedFile, BackendError> {
        let size = file.size();
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let form = multipart::Form::new()
            .text("action", self.actions.upload.clone())
            .text("nonce", self.nonce.clone())
            .part("file", part);

        progress(0.0);
        tracing::debug!(file_name = %file.file_name, size, "uploading file");
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let data = read_envelope(response).await?;
        progress(1.0);

        let url = data
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Malformed("upload response without url".into()))?
            .to_string();
        let reported = lenient_size(data.get("size"));
        Ok(UploadedFile { url, size: if reported > 0 { reported } else { size } })
    }

    async fn save_signature(&self, data_uri: String) -> std::result::Result<String, BackendError> {
        let data = self
            .post(&self.actions.signature, vec![("signature", data_uri)])
            .await?;
        match data {
            Value::String(url) if !url.is_empty() => Ok(url),
            Value::Object(map) => map
                .get("url")
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| BackendError::Malformed("signature response without url".into())),
            _ => Err(BackendError::Malformed("signature response without url".into())),
        }
    }
}
