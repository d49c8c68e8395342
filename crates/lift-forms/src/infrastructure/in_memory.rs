//! In-memory backend for tests and offline use

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::value_objects::FormId;
use crate::ports::outbound::{
    BackendError, FormBackend, LoadedForm, ProgressFn, SaveRequest, UploadFile, UploadedFile,
};

/// Stores forms the way the endpoint does: payload and settings as JSON text.
#[derive(Default)]
pub struct InMemoryFormBackend {
    forms: RwLock<HashMap<FormId, LoadedForm>>,
    uploads: RwLock<HashMap<String, u64>>,
    next_id: AtomicU64,
    saves: AtomicU64,
    failing: AtomicBool,
    fail_next: AtomicU64,
    delays: Mutex<VecDeque<Duration>>,
}

impl InMemoryFormBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following request fail with `Rejected`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reject only the next `count` requests
    pub fn fail_next(&self, count: u64) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Delay the next request by `delay`; queued delays apply in call order
    pub fn push_delay(&self, delay: Duration) {
        self.delays.lock().push_back(delay);
    }

    /// Store a raw record, e.g. a legacy or corrupted payload
    pub fn insert_raw(&self, form_id: FormId, form: LoadedForm) {
        self.forms.write().insert(form_id, form);
    }

    pub fn stored(&self, form_id: FormId) -> Option<LoadedForm> {
        self.forms.read().get(&form_id).cloned()
    }

    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.read().len()
    }

    async fn enter(&self) -> Result<(), BackendError> {
        let rejected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if rejected || self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("backend unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl FormBackend for InMemoryFormBackend {
    async fn save_form(&self, request: SaveRequest) -> Result<FormId, BackendError> {
        self.enter().await?;
        let form_id = if request.form_id.is_draft() {
            FormId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
        } else {
            request.form_id
        };
        self.forms.write().insert(
            form_id,
            LoadedForm {
                form_data: Value::String(request.fields),
                form_title: request.name,
                form_description: request.description,
                form_settings: Value::String(request.settings),
            },
        );
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(form_id)
    }

    async fn load_form(&self, form_id: FormId) -> Result<LoadedForm, BackendError> {
        self.enter().await?;
        self.stored(form_id)
            .ok_or_else(|| BackendError::Rejected(format!("form {} not found", form_id)))
    }

    async fn upload_file(
        &self,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<UploadedFile, BackendError> {
        progress(0.0);
        self.enter().await?;
        let size = file.size();
        let url = format!("memory://uploads/{}/{}", uuid::Uuid::new_v4().simple(), file.file_name);
        self.uploads.write().insert(url.clone(), size);
        progress(1.0);
        Ok(UploadedFile { url, size })
    }

    async fn save_signature(&self, data_uri: String) -> Result<String, BackendError> {
        self.enter().await?;
        if !data_uri.starts_with("data:image/") {
            return Err(BackendError::Rejected("invalid signature data".into()));
        }
        let url = format!("memory://signatures/{}.svg", uuid::Uuid::new_v4().simple());
        self.uploads.write().insert(url.clone(), data_uri.len() as u64);
        Ok(url)
    }
}
