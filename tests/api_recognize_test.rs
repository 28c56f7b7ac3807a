//! Tests for /api/image-recognition endpoint against a mocked Ark API.

mod common;

use axum::http::StatusCode;
use common::{app::TEST_ARK_KEY, fixtures, MultipartBody, TestApp};
use imgkit::services::vendors::ark::DEFAULT_QUESTION;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 30, "completion_tokens": 12, "total_tokens": 42}
    }))
}

#[tokio::test]
async fn test_recognize_with_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/chat/completions"))
        .and(header("authorization", format!("Bearer {TEST_ARK_KEY}").as_str()))
        .and(body_string_contains("How many cats are there?"))
        .and(body_string_contains("data:image/jpeg;base64,"))
        .respond_with(chat_reply("There are two cats."))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_vendors(&server);
    let form = MultipartBody::new()
        .image("cats.jpg", "image/jpeg", &fixtures::jpeg(32, 32, 90))
        .text("prompt", "How many cats are there?");
    let response = app.post_multipart("/api/image-recognition", form).await;

    common::assert_ok(&response);
    let json: serde_json::Value = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["content"], "There are two cats.");
    assert_eq!(json["usage"]["total_tokens"], 42);
}

#[tokio::test]
async fn test_recognize_uses_default_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/chat/completions"))
        .and(body_string_contains(DEFAULT_QUESTION))
        .and(body_string_contains("data:image/png;base64,"))
        .respond_with(chat_reply("A small test pattern."))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_vendors(&server);
    let form = MultipartBody::new()
        .image("pattern.png", "image/png", &fixtures::png_rgba(8, 8))
        .text("prompt", "   ");
    let response = app.post_multipart("/api/image-recognition", form).await;

    common::assert_ok(&response);
    let json: serde_json::Value = response.json();
    assert_eq!(json["content"], "A small test pattern.");
}

#[tokio::test]
async fn test_recognize_empty_answer_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let app = TestApp::with_vendors(&server);
    let form = MultipartBody::new().image("a.jpg", "image/jpeg", &fixtures::jpeg(16, 16, 90));
    let response = app.post_multipart("/api/image-recognition", form).await;

    common::assert_error(&response, StatusCode::BAD_GATEWAY, "Malformed");
}

#[tokio::test]
async fn test_recognize_upstream_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "AuthenticationError", "message": "The API key is invalid"}
        })))
        .mount(&server)
        .await;

    let app = TestApp::with_vendors(&server);
    let form = MultipartBody::new().image("a.jpg", "image/jpeg", &fixtures::jpeg(16, 16, 90));
    let response = app.post_multipart("/api/image-recognition", form).await;

    common::assert_error(&response, StatusCode::BAD_GATEWAY, "The API key is invalid");
}

#[tokio::test]
async fn test_recognize_rejects_oversized_file_before_vendor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(chat_reply("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = TestApp::vendor_config(&server);
    config.uploads.recognize.max_bytes = 512;
    let app = TestApp::with_config(config, TestApp::test_credentials());

    let form = MultipartBody::new().image("big.jpg", "image/jpeg", &fixtures::jpeg(200, 200, 95));
    let response = app.post_multipart("/api/image-recognition", form).await;

    common::assert_error(&response, StatusCode::PAYLOAD_TOO_LARGE, "too large");
}

#[tokio::test]
async fn test_recognize_without_api_key() {
    let app = TestApp::new();

    let form = MultipartBody::new().image("a.jpg", "image/jpeg", &fixtures::jpeg(16, 16, 90));
    let response = app.post_multipart("/api/image-recognition", form).await;

    common::assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "ARK_API_KEY");
}

#[tokio::test]
async fn test_recognize_unreachable_vendor_is_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let closed = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut config = imgkit::models::AppConfig::default();
    config.vendors.ark.base_url = closed;
    config.vendors.ark.timeout_secs = 2;
    let app = TestApp::with_config(config, TestApp::test_credentials());

    let form = MultipartBody::new().image("a.jpg", "image/jpeg", &fixtures::jpeg(16, 16, 90));
    let response = app.post_multipart("/api/image-recognition", form).await;

    common::assert_error(&response, StatusCode::BAD_GATEWAY, "Upstream request failed");
}
