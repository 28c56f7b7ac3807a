//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

use imgkit::models::{ApiKey, AppConfig, Credentials};
use imgkit::server::{build_router, create_app_state, AppState};
use imgkit::services::{GenerationHistory, ImageGenerator};

use super::multipart::MultipartBody;

pub const TEST_ARK_KEY: &str = "test-ark-key";
pub const TEST_REMOVE_BG_KEY: &str = "test-remove-bg-key";

/// Test application with router and direct access to services
pub struct TestApp {
    router: axum::Router,
    pub history: Arc<GenerationHistory>,
}

impl TestApp {
    /// Default config and no API keys: vendor endpoints report a missing credential
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), Credentials::default())
    }

    /// Point both vendors at `server` and supply test API keys
    pub fn with_vendors(server: &MockServer) -> Self {
        Self::with_config(Self::vendor_config(server), Self::test_credentials())
    }

    pub fn with_config(config: AppConfig, credentials: Credentials) -> Self {
        let state = create_app_state(config, credentials).expect("Failed to create app state");
        Self::from_state(state)
    }

    /// Replace the generation adapter, keeping everything else real
    pub fn with_generator(generator: Arc<dyn ImageGenerator>) -> Self {
        let mut state = create_app_state(AppConfig::default(), Self::test_credentials())
            .expect("Failed to create app state");
        state.generator = generator;
        Self::from_state(state)
    }

    pub fn from_state(state: AppState) -> Self {
        // Keep references for test assertions
        let history = state.history.clone();

        // Build router using shared server module (same as production)
        let router = build_router(state);

        Self { router, history }
    }

    pub fn vendor_config(server: &MockServer) -> AppConfig {
        let mut config = AppConfig::default();
        config.vendors.ark.base_url = server.uri();
        config.vendors.ark.timeout_secs = 5;
        config.vendors.remove_bg.base_url = server.uri();
        config.vendors.remove_bg.timeout_secs = 5;
        config
    }

    pub fn test_credentials() -> Credentials {
        Credentials {
            ark: ApiKey::new(TEST_ARK_KEY),
            remove_bg: ApiKey::new(TEST_REMOVE_BG_KEY),
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a DELETE request to the given path
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Request::delete(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Make a POST request with a multipart/form-data body
    pub async fn post_multipart(&self, path: &str, form: MultipartBody) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", form.content_type())
            .body(Body::from(form.finish()))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// A header value as text, if present
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// A numeric header value
    pub fn header_u64(&self, name: &str) -> u64 {
        self.header(name)
            .unwrap_or_else(|| panic!("Missing header {name}"))
            .parse()
            .unwrap_or_else(|_| panic!("Header {name} is not a number"))
    }

    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }

    pub fn is_jpeg(&self) -> bool {
        self.body.starts_with(&[0xFF, 0xD8, 0xFF])
    }
}
