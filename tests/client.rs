//! HTTP client tests against a local wiremock server.

use extraction_playground::{
    ClientConfig, ExtractionOrchestrator, ExtractionService, ExtractionStatus,
    HttpExtractionService, PlaygroundError, UploadCandidate, GENERIC_FAILURE_MESSAGE,
    PDF_MEDIA_TYPE,
};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> HttpExtractionService {
    let config = ClientConfig::builder()
        .base_url(format!("{}/api/v1", server.uri()))
        .build()
        .unwrap();
    HttpExtractionService::new(&config).unwrap()
}

fn pdf() -> UploadCandidate {
    UploadCandidate::new("paper.pdf", PDF_MEDIA_TYPE, b"%PDF-1.7\n%test body".to_vec())
}

fn metrics(secs: f64, elements: u64, chars: u64) -> serde_json::Value {
    serde_json::json!({
        "num_pages": 2,
        "num_elements": elements,
        "word_count": elements * 4,
        "character_count": chars,
        "extraction_time": secs,
        "element_counts": {"text": elements}
    })
}

#[tokio::test]
async fn list_models_decodes_catalogue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "docling", "display_name": "Docling", "provider": "IBM",
             "capabilities": ["tables"], "gpu_required": false},
            {"name": "surya"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let models = service(&server).list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].label(), "Docling");
    assert_eq!(models[0].capabilities, ["tables"]);
    assert_eq!(models[1].label(), "surya");
}

#[tokio::test]
async fn single_extraction_sends_multipart_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/extract"))
        .and(body_string_contains("name=\"file\"; filename=\"paper.pdf\""))
        .and(body_string_contains("name=\"model\"\r\n\r\ndocling"))
        .and(body_string_contains("name=\"generate_annotations\"\r\n\r\ntrue"))
        .and(body_string_contains("%PDF-1.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": "t-1",
            "model": "docling",
            "status": "completed",
            "markdown_content": "# Title",
            "metrics": metrics(1.5, 4, 7)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = service(&server).extract_single(&pdf(), "docling").await.unwrap();
    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.markdown_content, "# Title");
    assert_eq!(result.metrics.unwrap().extraction_time_secs, 1.5);
}

#[tokio::test]
async fn annotations_flag_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/extract"))
        .and(body_string_contains("name=\"generate_annotations\"\r\n\r\nfalse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "docling", "status": "completed", "markdown_content": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(format!("{}/api/v1", server.uri()))
        .generate_annotations(false)
        .build()
        .unwrap();
    let result = HttpExtractionService::new(&config)
        .unwrap()
        .extract_single(&pdf(), "docling")
        .await
        .unwrap();
    assert_eq!(result.markdown_content, "");
}

// Keys deliberately out of alphabetical order; a literal body keeps them so.
const COMPARE_BODY: &str = r#"{
    "task_id": "cmp-7",
    "results": {
        "mineru": {"model": "mineru", "status": "completed", "markdown_content": "mmm",
                   "metrics": {"num_pages": 2, "num_elements": 9, "word_count": 36,
                               "character_count": 3, "extraction_time": 3.0,
                               "element_counts": {"text": 9}}},
        "docling": {"model": "docling", "status": "completed", "markdown_content": "dddd",
                    "metrics": {"num_pages": 2, "num_elements": 5, "word_count": 20,
                                "character_count": 4, "extraction_time": 1.0,
                                "element_counts": {"text": 5}}}
    },
    "comparison_metrics": {
        "fastest_model": "docling",
        "most_elements": "mineru",
        "longest_content": "docling",
        "speed_comparison": {"mineru": 3.0, "docling": 1.0},
        "element_comparison": {"mineru": 9, "docling": 5},
        "content_length_comparison": {"mineru": 3, "docling": 4}
    }
}"#;

#[tokio::test]
async fn comparison_joins_models_and_keeps_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/extract/compare"))
        .and(body_string_contains("name=\"models\"\r\n\r\nmineru,docling"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(COMPARE_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let models = vec!["mineru".to_string(), "docling".to_string()];
    let cmp = service(&server)
        .extract_compare(&pdf(), &models)
        .await
        .unwrap()
        .into_result();

    let keys: Vec<&str> = cmp.results().keys().map(String::as_str).collect();
    assert_eq!(keys, ["mineru", "docling"]);
    assert_eq!(cmp.metrics().fastest_model.as_deref(), Some("docling"));
    assert_eq!(cmp.metrics().most_elements_model.as_deref(), Some("mineru"));
    assert_eq!(cmp.metrics().longest_content_model.as_deref(), Some("docling"));
    let speed: Vec<&str> = cmp.metrics().speed_comparison.keys().map(String::as_str).collect();
    assert_eq!(speed, ["mineru", "docling"]);
}

#[tokio::test]
async fn error_detail_maps_to_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/extract"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"detail": "Unsupported model: foo"})),
        )
        .mount(&server)
        .await;

    let err = service(&server).extract_single(&pdf(), "foo").await.unwrap_err();
    assert!(matches!(err, PlaygroundError::ServiceError { status: 400, .. }));
    assert_eq!(err.service_detail(), Some("Unsupported model: foo"));
    assert_eq!(err.user_message(), "Unsupported model: foo");
}

#[tokio::test]
async fn server_error_without_detail_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/extract"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let svc = service(&server);
    let config = ClientConfig::default();
    let mut session = ExtractionOrchestrator::new(&config);
    session.select_file(pdf()).unwrap();
    session.toggle_model("docling");

    assert!(session.dispatch(&svc).await);
    assert!(!session.session().is_processing());
    assert_eq!(session.session().error_message(), Some(GENERIC_FAILURE_MESSAGE));
}

#[tokio::test]
async fn undecodable_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = service(&server).list_models().await.unwrap_err();
    assert!(matches!(err, PlaygroundError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(format!("{}/api/v1", server.uri()))
        .request_timeout_secs(1)
        .build()
        .unwrap();
    let err = HttpExtractionService::new(&config)
        .unwrap()
        .list_models()
        .await
        .unwrap_err();
    assert!(matches!(err, PlaygroundError::Timeout { secs: 1, .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:9/api/v1")
        .connect_timeout_secs(2)
        .build()
        .unwrap();
    let err = HttpExtractionService::new(&config)
        .unwrap()
        .list_models()
        .await
        .unwrap_err();
    assert!(matches!(err, PlaygroundError::Network { .. }), "{err:?}");
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}
