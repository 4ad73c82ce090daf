//! Cloud Vision, GLiNER, and image fetcher tests against mock servers.

use std::time::Duration;

use jadoo_inference::{
    CloudVisionBackend, CloudVisionConfig, Error, GlinerBackend, HttpImageFetcher, ImageFetcher,
    LabelBackend, NerBackend, RetryPolicy,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2)
        .base_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
}

fn vision(server: &MockServer) -> CloudVisionBackend {
    CloudVisionBackend::new(
        CloudVisionConfig::new("vision-key")
            .with_base_url(server.uri())
            .with_retry(fast_retry()),
    )
    .expect("backend")
}

// =============================================================================
// CLOUD VISION
// =============================================================================

#[tokio::test]
async fn test_detect_labels_returns_descriptions_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .and(query_param("key", "vision-key"))
        .and(body_partial_json(json!({
            "requests": [{
                "image": {"source": {"imageUri": "https://cdn.test/car.jpg"}},
                "features": [{"type": "LABEL_DETECTION"}]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{"labelAnnotations": [
                {"description": "Car", "score": 0.98},
                {"description": "Road", "score": 0.91}
            ]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let labels = vision(&server)
        .detect_labels("https://cdn.test/car.jpg")
        .await
        .expect("labels");
    assert_eq!(labels, vec!["Car", "Road"]);
}

#[tokio::test]
async fn test_detect_labels_error_field_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{"error": {"code": 7, "message": "We can not access the URL currently."}}]
        })))
        .mount(&server)
        .await;

    let err = vision(&server)
        .detect_labels("https://cdn.test/private.jpg")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("can not access"), "got {}", err);
}

#[tokio::test]
async fn test_detect_labels_no_annotations_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [{}]})))
        .mount(&server)
        .await;

    let labels = vision(&server)
        .detect_labels("https://cdn.test/blank.png")
        .await
        .expect("labels");
    assert!(labels.is_empty());
}

#[tokio::test]
async fn test_detect_labels_missing_image_response_is_a_failure() {
    let server = MockServer::start().await;

    for body in [json!({}), json!({"responses": []})] {
        server.reset().await;
        Mock::given(method("POST"))
            .and(path("/images:annotate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = vision(&server)
            .detect_labels("https://cdn.test/car.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(ref m) if m.contains("no response")));
    }
}

#[tokio::test]
async fn test_detect_labels_rate_limit_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{"labelAnnotations": [{"description": "Dog"}]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let labels = vision(&server)
        .detect_labels("https://cdn.test/dog.jpg")
        .await
        .expect("labels after retries");
    assert_eq!(labels, vec!["Dog"]);
}

// =============================================================================
// GLINER
// =============================================================================

#[tokio::test]
async fn test_gliner_extract_posts_types_and_threshold() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/extract"))
        .and(body_partial_json(json!({
            "text": "A Ford Mustang in Paris",
            "entity_types": ["product", "location"],
            "threshold": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [
                {"text": "Ford Mustang", "label": "product", "score": 0.93, "start": 2, "end": 14},
                {"text": "Paris", "label": "location", "score": 0.88, "start": 18, "end": 23}
            ],
            "model": "gliner_medium-v2.1",
            "text_length": 23
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GlinerBackend::new(server.uri()).with_retry(fast_retry());
    let entities = backend
        .extract("A Ford Mustang in Paris", &["product", "location"], Some(0.5))
        .await
        .expect("extract");
    let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Ford Mustang", "Paris"]);
}

#[tokio::test]
async fn test_gliner_server_error_is_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/extract"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad entity types"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GlinerBackend::new(server.uri()).with_retry(fast_retry());
    let err = backend
        .extract("some text", &["person"], None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 422, .. }), "got {:?}", err);
}

// =============================================================================
// IMAGE FETCHER
// =============================================================================

#[tokio::test]
async fn test_fetch_detects_png_from_bytes() {
    let server = MockServer::start().await;
    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    Mock::given(method("GET"))
        .and(path("/images/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(png.clone()),
        )
        .mount(&server)
        .await;

    let fetcher = HttpImageFetcher::with_defaults()
        .expect("fetcher")
        .with_retry(fast_retry());
    let payload = fetcher
        .fetch(&format!("{}/images/upload", server.uri()))
        .await
        .expect("fetch");
    assert_eq!(payload.mime_type, "image/png");
    assert_eq!(payload.data, png);
}

#[tokio::test]
async fn test_fetch_not_found_is_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpImageFetcher::with_defaults()
        .expect("fetcher")
        .with_retry(fast_retry());
    let err = fetcher
        .fetch(&format!("{}/missing.jpg", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(_)), "got {:?}", err);
}
