//! AjaxBackend against a mock admin-ajax endpoint

use std::sync::Arc;

use lift_forms::ports::outbound::{LoadedForm, ProgressFn, SaveRequest, UploadFile};
use lift_forms::{
    AjaxBackend, BackendError, BuilderConfig, FieldType, FormBackend, FormBuilder, FormId,
    FormsError,
};
use parking_lot::Mutex;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AJAX_PATH: &str = "/wp-admin/admin-ajax.php";

async fn backend(server: &MockServer) -> AjaxBackend {
    let config = BuilderConfig {
        endpoint: format!("{}{}", server.uri(), AJAX_PATH),
        nonce: "n0nce".into(),
        ..Default::default()
    };
    AjaxBackend::new(&config).unwrap()
}

fn save_request() -> SaveRequest {
    SaveRequest {
        form_id: FormId::DRAFT,
        name: "Contact".into(),
        description: "Reach us".into(),
        fields: r#"{"layout":[],"fields":[]}"#.into(),
        settings: "{}".into(),
    }
}

#[tokio::test]
async fn save_posts_action_and_nonce() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AJAX_PATH))
        .and(body_string_contains("action=lift_forms_save"))
        .and(body_string_contains("nonce=n0nce"))
        .and(body_string_contains("name=Contact"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": { "form_id": "12" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let id = backend(&server).await.save_form(save_request()).await.unwrap();
    assert_eq!(id, FormId::new(12));
}

#[tokio::test]
async fn rejected_save_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "data": { "message": "Security check failed" } })),
        )
        .mount(&server)
        .await;

    let err = backend(&server).await.save_form(save_request()).await.unwrap_err();
    assert_eq!(err, BackendError::Rejected("Security check failed".into()));
}

#[tokio::test]
async fn bare_minus_one_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("-1"))
        .mount(&server)
        .await;

    let err = backend(&server).await.load_form(FormId::new(3)).await.unwrap_err();
    assert!(matches!(err, BackendError::Rejected(_)));
}

#[tokio::test]
async fn server_error_page_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Fatal error</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).await.save_form(save_request()).await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn load_keeps_raw_form_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=lift_forms_get"))
        .and(body_string_contains("form_id=3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "form_data": "[]", "form_title": "Feedback" }
        })))
        .mount(&server)
        .await;

    let loaded = backend(&server).await.load_form(FormId::new(3)).await.unwrap();
    assert_eq!(
        loaded,
        LoadedForm {
            form_data: json!("[]"),
            form_title: "Feedback".into(),
            form_description: String::new(),
            form_settings: serde_json::Value::Null,
        }
    );
}

#[tokio::test]
async fn upload_reports_progress_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("lift_forms_upload_file"))
        .and(body_string_contains("filename=\"cv.pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "url": "https://example.test/uploads/cv.pdf", "size": "5" }
        })))
        .mount(&server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let progress: ProgressFn = {
        let seen = seen.clone();
        Arc::new(move |p| seen.lock().push(p))
    };
    let file = UploadFile {
        file_name: "cv.pdf".into(),
        mime_type: "application/pdf".into(),
        bytes: b"%PDF-".to_vec(),
    };
    let uploaded = backend(&server).await.upload_file(file, progress).await.unwrap();
    assert_eq!(uploaded.url, "https://example.test/uploads/cv.pdf");
    assert_eq!(uploaded.size, 5);
    assert_eq!(*seen.lock(), vec![0.0, 1.0]);
}

#[tokio::test]
async fn signature_url_from_object_or_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("action=lift_forms_save_signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "url": "https://example.test/sig.png" }
        })))
        .mount(&server)
        .await;

    let url = backend(&server)
        .await
        .save_signature("data:image/svg+xml;base64,PHN2Zy8+".into())
        .await
        .unwrap();
    assert_eq!(url, "https://example.test/sig.png");
}

#[tokio::test]
async fn builder_load_of_unparsable_data_gives_empty_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "form_data": "not-json", "form_title": "Old form" }
        })))
        .mount(&server)
        .await;

    let builder = FormBuilder::new(Arc::new(backend(&server).await), BuilderConfig::default());
    builder.load(FormId::new(4)).await.unwrap();
    let form = builder.snapshot();
    assert!(form.is_empty());
    assert!(form.id().is_draft());
    assert_eq!(form.title(), "Old form");
}

#[tokio::test]
async fn builder_save_sends_serialized_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("email_1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": { "form_id": 21 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let builder = FormBuilder::new(Arc::new(backend(&server).await), BuilderConfig::default());
    builder.edit(|form| Ok(form.append_field(FieldType::Email))).unwrap();
    let id = builder.save().await.unwrap();
    assert_eq!(id, FormId::new(21));
    assert_eq!(builder.snapshot().id(), id);
}

#[tokio::test]
async fn builder_save_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false, "data": "Nope" })))
        .mount(&server)
        .await;

    let builder = FormBuilder::new(Arc::new(backend(&server).await), BuilderConfig::default());
    builder.edit(|form| Ok(form.append_field(FieldType::Text))).unwrap();
    assert!(matches!(builder.save().await, Err(FormsError::Backend(BackendError::Rejected(_)))));
    assert!(builder.snapshot().id().is_draft());
}
