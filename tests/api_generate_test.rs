//! Tests for /api/ai-generate and the generation history.

mod common;

use axum::http::StatusCode;
use common::{app::TEST_ARK_KEY, fakes::CountingGenerator, fixtures, TestApp};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_generation(server: &MockServer, image_path: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v3/images/generations"))
        .and(header("authorization", format!("Bearer {TEST_ARK_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1_757_321_139,
            "data": [{"url": format!("{}{image_path}", server.uri()), "size": "1024x768"}],
            "usage": {"generated_images": 1, "output_tokens": 16384, "total_tokens": 16384}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_generate_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/images/generations"))
        .and(body_partial_json(json!({
            "prompt": "a red fox in the snow, anime style, Japanese illustration",
            "size": "1024x768",
            "response_format": "url"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "https://cdn.example.com/fox.jpeg"}],
            "usage": {"generated_images": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_vendors(&server);
    let response = app
        .post_json(
            "/api/ai-generate",
            r#"{"prompt": "  a red fox in the snow ", "style": "anime", "size": "1024x768"}"#,
        )
        .await;

    common::assert_ok(&response);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], 1);
    assert_eq!(body["image_url"], "https://cdn.example.com/fox.jpeg");
    assert_eq!(
        body["prompt"],
        "a red fox in the snow, anime style, Japanese illustration"
    );
    assert_eq!(body["original_prompt"], "a red fox in the snow");
    assert_eq!(body["style"], "anime");
    assert_eq!(body["size"], "1024x768");
    assert_eq!(body["usage"]["generated_images"], 1);
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn test_generate_defaults_style_and_size() {
    let generator = Arc::new(CountingGenerator::default());
    let app = TestApp::with_generator(generator.clone());

    let response = app
        .post_json("/api/ai-generate", r#"{"prompt": "a lighthouse"}"#)
        .await;

    common::assert_ok(&response);
    let body: serde_json::Value = response.json();
    assert_eq!(body["style"], "realistic");
    assert_eq!(body["size"], "512x512");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_blank_prompt_never_reaches_generator() {
    let generator = Arc::new(CountingGenerator::default());
    let app = TestApp::with_generator(generator.clone());

    for body in [r#"{"prompt": ""}"#, r#"{"prompt": "  \n\t "}"#, r#"{}"#] {
        let response = app.post_json("/api/ai-generate", body).await;
        common::assert_error(&response, StatusCode::BAD_REQUEST, "prompt");
    }

    assert_eq!(generator.calls(), 0);
    assert!(app.history.list().await.is_empty());
}

#[tokio::test]
async fn test_generate_rejects_unknown_style_and_size() {
    let generator = Arc::new(CountingGenerator::default());
    let app = TestApp::with_generator(generator.clone());

    let response = app
        .post_json("/api/ai-generate", r#"{"prompt": "fox", "style": "baroque"}"#)
        .await;
    common::assert_error(&response, StatusCode::BAD_REQUEST, "unknown style");

    let response = app
        .post_json("/api/ai-generate", r#"{"prompt": "fox", "size": "640x480"}"#)
        .await;
    common::assert_error(&response, StatusCode::BAD_REQUEST, "size");

    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_generate_rejects_malformed_json() {
    let app = TestApp::new();

    let response = app.post_json("/api/ai-generate", "{not json").await;

    common::assert_error(&response, StatusCode::BAD_REQUEST, "body");
}

#[tokio::test]
async fn test_generate_upstream_error_is_distinct() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/images/generations"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": "InternalServiceError", "message": "The service is overloaded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_vendors(&server);
    let response = app
        .post_json("/api/ai-generate", r#"{"prompt": "a red fox"}"#)
        .await;

    common::assert_error(&response, StatusCode::BAD_GATEWAY, "The service is overloaded");
    common::assert_error(&response, StatusCode::BAD_GATEWAY, "500");
    assert!(app.history.list().await.is_empty());
}

#[tokio::test]
async fn test_generate_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/images/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"url": "https://cdn.example.com/late.jpeg"}]}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = TestApp::vendor_config(&server);
    config.vendors.ark.timeout_secs = 1;
    let app = TestApp::with_config(config, TestApp::test_credentials());

    let response = app
        .post_json("/api/ai-generate", r#"{"prompt": "a slow fox"}"#)
        .await;

    common::assert_error(&response, StatusCode::BAD_GATEWAY, "Upstream request failed");
    assert!(app.history.list().await.is_empty());
}

#[tokio::test]
async fn test_generate_without_api_key() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/ai-generate", r#"{"prompt": "a red fox"}"#)
        .await;

    common::assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "ARK_API_KEY");
}

#[tokio::test]
async fn test_history_lists_most_recent_first_and_clears() {
    let generator = Arc::new(CountingGenerator::default());
    let app = TestApp::with_generator(generator);

    for prompt in ["first", "second", "third"] {
        let body = json!({ "prompt": prompt }).to_string();
        common::assert_ok(&app.post_json("/api/ai-generate", &body).await);
    }

    let response = app.get("/api/ai-generate/history").await;
    common::assert_ok(&response);
    let entries: Vec<serde_json::Value> = response.json();
    let prompts: Vec<&str> = entries
        .iter()
        .map(|e| e["original_prompt"].as_str().unwrap())
        .collect();
    assert_eq!(prompts, vec!["third", "second", "first"]);
    assert_eq!(entries[0]["id"], 3);

    let response = app.delete("/api/ai-generate/history").await;
    common::assert_ok(&response);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["cleared"], 3);

    let entries: Vec<serde_json::Value> = app.get("/api/ai-generate/history").await.json();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_download_generated_image() {
    let server = MockServer::start().await;
    mount_generation(&server, "/cdn/fox.jpeg").await;
    let image = fixtures::jpeg(24, 24, 90);
    Mock::given(method("GET"))
        .and(path("/cdn/fox.jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(image.clone(), "image/jpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_vendors(&server);
    let created: serde_json::Value = app
        .post_json("/api/ai-generate", r#"{"prompt": "a red fox!", "size": "1024x768"}"#)
        .await
        .json();
    let id = created["id"].as_u64().unwrap();

    let response = app
        .get(&format!("/api/ai-generate/history/{id}/download"))
        .await;

    common::assert_ok(&response);
    assert_eq!(response.header("content-type"), Some("image/jpeg"));
    let disposition = response.header("content-disposition").unwrap();
    assert!(
        disposition.starts_with("attachment; filename=\"ai_generated_a_red_fox__"),
        "unexpected disposition {disposition}"
    );
    assert!(disposition.ends_with(".jpg\""));
    assert_eq!(response.body, image);
}

#[tokio::test]
async fn test_download_unknown_id() {
    let app = TestApp::new();

    let response = app.get("/api/ai-generate/history/42/download").await;

    common::assert_error(&response, StatusCode::NOT_FOUND, "Not found");
}
