//! Application layer
//!
//! `FormBuilder` is the single owner of the form being edited. Every change
//! goes through it so the canvas tree is reconciled right after the model
//! moves, and every network completion is checked against the request
//! sequence before it may touch the model.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::BuilderConfig;
use crate::dnd::{DragController, DragSource, DropIndicator, DropOutcome, DropTarget};
use crate::domain::aggregates::Form;
use crate::domain::events::FormEvent;
use crate::domain::services::submission::check_file;
use crate::domain::services::{validate_submission, FieldError, SubmittedValue};
use crate::domain::value_objects::{FieldId, FieldType, FormId};
use crate::error::{FormsError, Result};
use crate::persistence::{parse_form_data, parse_settings, serialize};
use crate::ports::outbound::{FormBackend, ProgressFn, SaveRequest, UploadFile, UploadedFile};
use crate::render::{read_back, reconcile, render, to_html, EditSurface, Patch, RenderTree};
use crate::signature::SignaturePad;

/// Hands out request sequence numbers. Only the most recently issued
/// request may apply its completion.
#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: AtomicU64,
}

impl RequestTracker {
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == seq
    }

    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

/// Builder controller
pub struct FormBuilder {
    form: Arc<RwLock<Form>>,
    tree: Arc<RwLock<RenderTree>>,
    dnd: Mutex<DragController>,
    backend: Arc<dyn FormBackend>,
    config: BuilderConfig,
    requests: RequestTracker,
    patches: Mutex<Vec<Patch>>,
    events: Mutex<Vec<FormEvent>>,
}

impl FormBuilder {
    /// Start from an empty draft in the configured layout mode
    pub fn new(backend: Arc<dyn FormBackend>, config: BuilderConfig) -> Self {
        let form = Form::draft("").with_mode(config.layout_mode);
        Self::with_form(backend, config, form)
    }

    pub fn with_form(backend: Arc<dyn FormBackend>, config: BuilderConfig, mut form: Form) -> Self {
        let events = form.take_events();
        let tree = render(&form);
        Self {
            form: Arc::new(RwLock::new(form)),
            tree: Arc::new(RwLock::new(tree)),
            dnd: Mutex::new(DragController::new()),
            backend,
            config,
            requests: RequestTracker::default(),
            patches: Mutex::new(Vec::new()),
            events: Mutex::new(events),
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Copy of the current model
    pub fn snapshot(&self) -> Form {
        self.form.read().clone()
    }

    /// Copy of the current canvas tree
    pub fn tree(&self) -> RenderTree {
        self.tree.read().clone()
    }

    pub fn html(&self) -> String {
        to_html(&self.tree.read())
    }

    /// Canvas patches accumulated since the last call
    pub fn take_patches(&self) -> Vec<Patch> {
        std::mem::take(&mut *self.patches.lock())
    }

    /// Domain events accumulated since the last call
    pub fn take_events(&self) -> Vec<FormEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Run a model operation and reconcile the canvas. A failed operation
    /// leaves both untouched.
    pub fn edit<T>(&self, op: impl FnOnce(&mut Form) -> Result<T>) -> Result<T> {
        let mut form = self.form.write();
        let out = op(&mut form)?;
        let events = form.take_events();
        let patches = {
            let mut tree = self.tree.write();
            reconcile(&form, &mut tree)
        };
        debug!(events = events.len(), patches = patches.len(), "form edited");
        self.events.lock().extend(events);
        self.patches.lock().extend(patches);
        Ok(out)
    }

    fn replace(&self, mut form: Form) {
        let events = form.take_events();
        let mut current = self.form.write();
        *self.tree.write() = render(&form);
        *current = form;
        self.events.lock().extend(events);
        self.patches.lock().clear();
    }

    // =========================================================================
    // Edit surface
    // =========================================================================

    pub fn open_editor(&self, field_id: &FieldId) -> Result<EditSurface> {
        let form = self.form.read();
        let field = form
            .field(field_id)
            .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
        Ok(EditSurface::open(field))
    }

    pub fn apply_editor(&self, field_id: &FieldId, surface: EditSurface) -> Result<()> {
        self.edit(|form| form.update_field(field_id, surface.into_patch()))
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    pub fn drag_start(&self, source: DragSource) -> Result<()> {
        self.dnd.lock().begin(source)
    }

    // Lock order everywhere: dnd, then form, then tree.
    pub fn drag_over(&self, target: &DropTarget) -> Result<Option<DropIndicator>> {
        let mut dnd = self.dnd.lock();
        let form = self.form.read();
        let boxes = self.tree.read().row_boxes();
        dnd.hover(&form, target, &boxes)
    }

    pub fn drag_leave(&self) {
        self.dnd.lock().leave();
    }

    pub fn drop_on(&self, target: DropTarget) -> Result<DropOutcome> {
        let mut dnd = self.dnd.lock();
        let boxes = self.tree.read().row_boxes();
        self.edit(|form| dnd.complete(form, target, &boxes))
    }

    pub fn drag_end(&self) -> DropOutcome {
        self.dnd.lock().end()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Rebuild the model from the canvas when the model has lost its fields
    /// while the canvas still shows some. Returns whether it did.
    pub fn recover(&self) -> bool {
        let mut form = self.form.write();
        let tree = self.tree.read();
        if form.field_count() == 0 && tree.field_count() > 0 {
            warn!(
                fields = tree.field_count(),
                "model has no fields but the canvas does, rebuilding from canvas"
            );
            *form = read_back(&tree);
            true
        } else {
            false
        }
    }

    fn save_request(&self) -> Result<SaveRequest> {
        let form = self.form.read();
        let payload = serialize(&form);
        Ok(SaveRequest {
            form_id: form.id(),
            name: form.title().to_string(),
            description: form.description().to_string(),
            fields: serde_json::to_string(&payload)?,
            settings: serde_json::to_string(form.settings())?,
        })
    }

    /// Persist the form. A draft adopts the id the backend assigns even when
    /// a newer request overtook this one, so a failed later save cannot leave
    /// the stored record orphaned. An id already adopted is never replaced.
    /// Failure leaves the model as it was.
    pub async fn save(&self) -> Result<FormId> {
        self.recover();
        let request = self.save_request()?;
        let seq = self.requests.issue();
        info!(seq, form_id = %request.form_id, "saving form");

        let form_id = match self.backend.save_form(request).await {
            Ok(id) => id,
            Err(e) => {
                warn!(seq, error = %e, "save failed");
                return Err(e.into());
            }
        };

        if !self.requests.is_current(seq) {
            debug!(seq, latest = self.requests.latest(), %form_id, "save completed out of order");
        }
        self.edit(|form| {
            if form.id().is_draft() || form.id() == form_id {
                form.adopt_id(form_id);
            }
            Ok(())
        })?;
        info!(seq, %form_id, "form saved");
        Ok(form_id)
    }

    /// Replace the model with a stored form. Data that cannot be parsed
    /// yields an empty draft; transport failures are errors.
    pub async fn load(&self, form_id: FormId) -> Result<()> {
        let seq = self.requests.issue();
        info!(seq, %form_id, "loading form");
        let loaded = self.backend.load_form(form_id).await.map_err(|e| {
            warn!(seq, error = %e, "load failed");
            FormsError::from(e)
        })?;

        if !self.requests.is_current(seq) {
            debug!(seq, latest = self.requests.latest(), "discarding stale load response");
            return Err(FormsError::Superseded(seq));
        }

        let settings = parse_settings(&loaded.form_settings);
        let form = match parse_form_data(&loaded.form_data) {
            Some(payload) => {
                payload.into_form(form_id, loaded.form_title, loaded.form_description, settings)
            }
            None => {
                warn!(%form_id, "stored form data is unreadable, starting an empty draft");
                let mut form = Form::draft(loaded.form_title);
                form.set_description(loaded.form_description);
                form.set_settings(settings);
                form
            }
        };
        info!(%form_id, fields = form.field_count(), rows = form.rows().len(), "form loaded");
        self.replace(form);
        Ok(())
    }

    /// Save every `period` while the form holds at least one field. Failures
    /// are logged and left for the next tick.
    pub fn spawn_autosave(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let builder = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let has_fields = builder.form.read().field_count() > 0;
                if !has_fields {
                    continue;
                }
                if let Err(e) = builder.save().await {
                    debug!(error = %e, "autosave failed");
                }
            }
        })
    }

    /// Autosave with the configured interval, if enabled
    pub fn start_autosave(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.config.autosave_interval().map(|period| self.spawn_autosave(period))
    }

    // =========================================================================
    // Uploads and signatures
    // =========================================================================

    /// Upload a file for a file field and store the returned URL as its value
    pub async fn upload_file(
        &self,
        field_id: &FieldId,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<UploadedFile> {
        {
            let form = self.form.read();
            let field = form
                .field(field_id)
                .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
            if field.field_type() != FieldType::File {
                return Err(FormsError::FileRejected(format!("{} is not a file field", field.name())));
            }
            if let Some(limit) = self.config.max_upload_bytes {
                if file.size() > limit {
                    return Err(FormsError::FileRejected(format!(
                        "{} exceeds the {} byte upload limit",
                        file.file_name, limit
                    )));
                }
            }
            check_file(field, &file.file_name, file.size())
                .map_err(|kind| FormsError::FileRejected(kind.to_string()))?;
        }

        let uploaded = self.backend.upload_file(file, progress).await?;
        info!(field_id = %field_id, url = %uploaded.url, size = uploaded.size, "file uploaded");
        self.edit(|form| form.set_field_value(field_id, uploaded.url.clone()))?;
        Ok(uploaded)
    }

    /// Store a drawn signature and keep its URL in the hidden field that
    /// accompanies the submission
    pub async fn save_signature(&self, field_id: &FieldId, pad: &SignaturePad) -> Result<String> {
        {
            let form = self.form.read();
            let field = form
                .field(field_id)
                .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
            if field.field_type() != FieldType::Hidden {
                return Err(FormsError::FileRejected(format!(
                    "{} cannot hold a signature",
                    field.name()
                )));
            }
        }
        let data_uri = pad.to_data_uri()?;
        let url = self.backend.save_signature(data_uri).await?;
        info!(field_id = %field_id, %url, "signature saved");
        self.edit(|form| form.set_field_value(field_id, url.clone()))?;
        Ok(url)
    }

    pub fn validate_submission(&self, values: &HashMap<String, SubmittedValue>) -> Vec<FieldError> {
        validate_submission(&self.form.read(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::FieldPatch;
    use crate::infrastructure::InMemoryFormBackend;
    use crate::ports::outbound::LoadedForm;
    use serde_json::{json, Value};

    fn builder() -> (Arc<InMemoryFormBackend>, FormBuilder) {
        let backend = Arc::new(InMemoryFormBackend::new());
        let builder = FormBuilder::new(backend.clone(), BuilderConfig::default());
        (backend, builder)
    }

    fn no_progress() -> ProgressFn {
        Arc::new(|_| {})
    }

    #[tokio::test]
    async fn test_first_save_adopts_id() {
        let (backend, builder) = builder();
        builder.edit(|f| Ok(f.append_field(FieldType::Text))).unwrap();
        let id = builder.save().await.unwrap();
        assert_eq!(builder.snapshot().id(), id);

        // Second save targets the same record
        assert_eq!(builder.save().await.unwrap(), id);
        assert_eq!(backend.save_count(), 2);
        assert!(builder.take_events().iter().any(|e| matches!(e, FormEvent::Saved { .. })));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_model() {
        let (backend, builder) = builder();
        builder.edit(|f| Ok(f.append_field(FieldType::Email))).unwrap();
        let before = builder.snapshot();
        backend.set_failing(true);
        assert!(matches!(builder.save().await, Err(FormsError::Backend(_))));
        let after = builder.snapshot();
        assert!(after.id().is_draft());
        assert_eq!(after.rows(), before.rows());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (backend, builder) = builder();
        builder
            .edit(|f| {
                let row = f.add_row(2);
                let col = f.row(&row).map(|r| r.columns()[1].id().clone()).unwrap();
                f.add_field(&col, FieldType::Radio)
            })
            .unwrap();
        let id = builder.save().await.unwrap();
        let saved = builder.snapshot();

        let other = FormBuilder::new(backend.clone(), BuilderConfig::default());
        other.load(id).await.unwrap();
        let loaded = other.snapshot();
        assert_eq!(loaded.id(), id);
        assert_eq!(loaded.rows(), saved.rows());
        assert_eq!(serialize(&loaded), serialize(&saved));
    }

    #[tokio::test]
    async fn test_not_json_loads_empty_draft() {
        let (backend, builder) = builder();
        backend.insert_raw(
            FormId::new(7),
            LoadedForm {
                form_data: json!("not-json"),
                form_title: "Broken".into(),
                form_description: String::new(),
                form_settings: Value::Null,
            },
        );
        builder.load(FormId::new(7)).await.unwrap();
        let form = builder.snapshot();
        assert!(form.id().is_draft());
        assert_eq!(form.title(), "Broken");
        assert_eq!(form.field_count(), 0);
        assert!(form.rows().is_empty());
    }

    #[tokio::test]
    async fn test_load_transport_failure_is_error() {
        let (_, builder) = builder();
        assert!(builder.load(FormId::new(99)).await.is_err());
    }

    #[tokio::test]
    async fn test_late_save_keeps_adopted_id() {
        let (backend, builder) = builder();
        let builder = Arc::new(builder);
        builder.edit(|f| Ok(f.append_field(FieldType::Text))).unwrap();

        backend.push_delay(Duration::from_millis(200));
        backend.push_delay(Duration::from_millis(1));
        let slow = tokio::spawn({
            let builder = builder.clone();
            async move { builder.save().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = builder.save().await.unwrap();
        let slow = slow.await.unwrap().unwrap();

        assert_ne!(slow, fast);
        assert_eq!(builder.snapshot().id(), fast);
    }

    #[tokio::test]
    async fn test_older_save_adopted_when_newer_fails() {
        let (backend, builder) = builder();
        let builder = Arc::new(builder);
        builder.edit(|f| Ok(f.append_field(FieldType::Text))).unwrap();

        backend.push_delay(Duration::from_millis(200));
        let slow = tokio::spawn({
            let builder = builder.clone();
            async move { builder.save().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        backend.fail_next(1);
        assert!(builder.save().await.is_err());

        let id = slow.await.unwrap().unwrap();
        assert!(!id.is_draft());
        assert_eq!(builder.snapshot().id(), id);

        // The next save updates the same record instead of creating another
        assert_eq!(builder.save().await.unwrap(), id);
        assert_eq!(backend.save_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_load_is_superseded() {
        let (backend, builder) = builder();
        let builder = Arc::new(builder);
        builder.edit(|f| Ok(f.append_field(FieldType::Date))).unwrap();
        let id = builder.save().await.unwrap();

        backend.push_delay(Duration::from_millis(200));
        let slow = tokio::spawn({
            let builder = builder.clone();
            async move { builder.load(id).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        builder.edit(|f| Ok(f.append_field(FieldType::Number))).unwrap();
        builder.save().await.unwrap();

        assert!(matches!(slow.await.unwrap(), Err(FormsError::Superseded(_))));
        assert_eq!(builder.snapshot().field_count(), 2);
    }

    #[tokio::test]
    async fn test_recover_from_canvas() {
        let (_, builder) = builder();
        builder.edit(|f| Ok(f.append_field(FieldType::Text))).unwrap();
        *builder.form.write() = Form::draft("");
        assert!(builder.recover());
        assert_eq!(builder.snapshot().field_count(), 1);
        assert!(!builder.recover());
    }

    #[tokio::test]
    async fn test_drag_drop_reconciles_tree() {
        let (_, builder) = builder();
        builder.drag_start(DragSource::PaletteRow { columns: 2 }).unwrap();
        builder.drop_on(DropTarget::Row { y: 0.0 }).unwrap();
        let tree = builder.tree();
        assert_eq!(tree.rows.len(), 1);
        assert_eq!(tree.rows[0].columns.len(), 2);
        assert!(!builder.take_patches().is_empty());
    }

    #[test]
    fn test_hover_and_drop_from_two_threads() {
        let (_, builder) = builder();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..200 {
                    let _ = builder.drag_start(DragSource::PaletteRow { columns: 1 });
                    let _ = builder.drop_on(DropTarget::Row { y: i as f64 });
                }
            });
            scope.spawn(|| {
                for i in 0..200 {
                    let _ = builder.drag_over(&DropTarget::Row { y: i as f64 });
                }
            });
        });

        assert!(builder.drag_end().is_cancelled());
        assert_eq!(builder.tree().rows.len(), builder.snapshot().rows().len());
    }

    #[tokio::test]
    async fn test_edit_surface_round_trip() {
        let (_, builder) = builder();
        let id = builder.edit(|f| Ok(f.append_field(FieldType::Select))).unwrap();
        let mut surface = builder.open_editor(&id).unwrap();
        surface.options_text = Some("   \n".into());
        assert!(matches!(builder.apply_editor(&id, surface), Err(FormsError::EmptyOptions)));
        assert_eq!(builder.snapshot().field(&id).unwrap().options().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_sets_field_value() {
        let (backend, builder) = builder();
        let id = builder.edit(|f| Ok(f.append_field(FieldType::File))).unwrap();
        builder
            .edit(|f| {
                f.update_field(
                    &id,
                    FieldPatch {
                        constraints: Some(crate::domain::aggregates::FieldConstraints {
                            accept: Some(".pdf".into()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                )
            })
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let progress: ProgressFn = {
            let seen = seen.clone();
            Arc::new(move |p| seen.lock().push(p))
        };
        let file = UploadFile {
            file_name: "cv.pdf".into(),
            mime_type: "application/pdf".into(),
            bytes: vec![0; 64],
        };
        let uploaded = builder.upload_file(&id, file, progress).await.unwrap();
        assert_eq!(uploaded.size, 64);
        assert_eq!(builder.snapshot().field(&id).unwrap().value(), Some(uploaded.url.as_str()));
        assert_eq!(*seen.lock(), vec![0.0, 1.0]);

        let exe = UploadFile { file_name: "x.exe".into(), mime_type: "application/octet-stream".into(), bytes: vec![1] };
        assert!(matches!(
            builder.upload_file(&id, exe, no_progress()).await,
            Err(FormsError::FileRejected(_))
        ));
        assert_eq!(backend.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_signature_into_hidden_field() {
        let (_, builder) = builder();
        let hidden = builder.edit(|f| Ok(f.append_field(FieldType::Hidden))).unwrap();
        let mut pad = SignaturePad::default();
        assert!(matches!(
            builder.save_signature(&hidden, &pad).await,
            Err(FormsError::EmptySignature)
        ));
        pad.begin_stroke(5.0, 5.0);
        pad.line_to(50.0, 40.0);
        pad.end_stroke();
        let url = builder.save_signature(&hidden, &pad).await.unwrap();
        assert_eq!(builder.snapshot().field(&hidden).unwrap().value(), Some(url.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_skips_empty_form() {
        let (backend, builder) = builder();
        let builder = Arc::new(builder);
        let handle = builder.spawn_autosave(Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(backend.save_count(), 0);

        builder.edit(|f| Ok(f.append_field(FieldType::Text))).unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.save_count(), 1);
        assert!(!builder.snapshot().id().is_draft());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_swallows_failures() {
        let (backend, builder) = builder();
        let builder = Arc::new(builder);
        builder.edit(|f| Ok(f.append_field(FieldType::Text))).unwrap();
        backend.set_failing(true);
        let handle = builder.spawn_autosave(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!handle.is_finished());
        backend.set_failing(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.save_count(), 1);
        handle.abort();
    }
}
