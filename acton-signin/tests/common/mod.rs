//! Shared setup for the HTTP integration tests

#![allow(dead_code)]

use acton_signin::auth::{AuthHandle, AuthOptions, CredentialsVerifier, MemoryAdapter};
use acton_signin::config::SigninConfig;
use acton_signin::oauth2::FlowStore;
use acton_signin::state::AppState;
use axum::http::{header, HeaderValue};
use axum_test::{TestResponse, TestServer};
use std::sync::Arc;

pub const GOOGLE_CLIENT_ID: &str = "google-client-id";

/// Stand-in for the process environment
pub fn lookup(key: &str) -> Option<String> {
    let value = match key {
        "GITHUB_ID" => "github-client-id",
        "GITHUB_SECRET" => "github-client-secret",
        "GOOGLE_CLIENT_ID" => GOOGLE_CLIENT_ID,
        "GOOGLE_CLIENT_SECRET" => "google-client-secret",
        "AUTH_SECRET" => "integration-secret",
        _ => return None,
    };
    Some(value.to_string())
}

pub fn config(providers: &[&str]) -> SigninConfig {
    let mut config = SigninConfig::default();
    config.auth.providers = providers.iter().map(|p| (*p).to_string()).collect();
    config.security.secure_cookies = false;
    config
}

pub struct TestApp {
    pub server: TestServer,
    pub auth: AuthHandle,
}

pub fn app(providers: &[&str]) -> TestApp {
    app_with_verifier(providers, None)
}

pub fn app_with_verifier(
    providers: &[&str],
    verifier: Option<Arc<dyn CredentialsVerifier>>,
) -> TestApp {
    app_from(config(providers), lookup, verifier, FlowStore::default())
}

/// App over any configuration, environment and flow store
pub fn app_from(
    config: SigninConfig,
    lookup: impl Fn(&str) -> Option<String>,
    verifier: Option<Arc<dyn CredentialsVerifier>>,
    flows: FlowStore,
) -> TestApp {
    let options =
        AuthOptions::from_config(&config, Arc::new(MemoryAdapter::new()), verifier, lookup)
            .expect("valid test configuration");
    let auth = AuthHandle::with_flow_store(options, flows);
    let server = TestServer::new(acton_signin::router(AppState::new(config, auth.clone())))
        .expect("test server");
    TestApp { server, auth }
}

/// The `Set-Cookie` value for `name`, if the response sets it
pub fn set_cookie(response: &TestResponse, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}

/// `name=value` part of a `Set-Cookie` value
pub fn pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

pub fn cookie_header(pairs: &[&str]) -> HeaderValue {
    HeaderValue::from_str(&pairs.join("; ")).expect("valid cookie header")
}

pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header not found")
        .to_str()
        .expect("Invalid Location header value")
        .to_string()
}

/// Fetch an anti-forgery token; returns the token and its cookie pair
pub async fn csrf(server: &TestServer) -> (String, String) {
    let response = server.get("/api/auth/csrf").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let token = body["csrfToken"].as_str().expect("csrfToken").to_string();
    let cookie = set_cookie(&response, "acton_signin.csrf_token").expect("csrf cookie");
    (token, pair(&cookie))
}

/// `state` query parameter of a provider authorization URL
pub fn state_param(url: &str) -> String {
    url.split(['?', '&'])
        .find_map(|param| param.strip_prefix("state="))
        .expect("state parameter")
        .to_string()
}
