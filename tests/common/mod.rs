#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use hrhub_api::{
    config::{AppConfig, ErpConfig, PayrollConfig, SessionConfig},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

/// Router wired to a mock ERP. Every test mounts the ERP responses it needs
/// on `erp` before sending requests.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    pub erp: MockServer,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Builds the app after letting the caller adjust the configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let erp = MockServer::start().await;

        let mut cfg = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 18_080,
            environment: "test".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: true,
            default_company: Some("Acme Ltd".to_string()),
            dashboard_cache_secs: 60,
            erp: ErpConfig {
                base_url: erp.uri(),
                api_key: "test-key".to_string(),
                api_secret: "test-secret".to_string(),
                request_timeout_secs: 5,
            },
            session: SessionConfig::default(),
            payroll: PayrollConfig::default(),
        };
        adjust(&mut cfg);

        let state = Arc::new(AppState::new(cfg).expect("failed to build app state"));
        let router = hrhub_api::app_router(state.clone());

        Self { router, state, erp }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

/// Reads the response body as JSON.
pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not json")
}

/// Every `Set-Cookie` header on the response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// `Cookie` header value for a signed-in user.
pub fn session_cookie(user: &str, role: &str, full_name: &str) -> String {
    format!(
        "user_id={}; user_role={}; full_name={}",
        user,
        role,
        full_name.replace(' ', "%20")
    )
}
