//! Sign-in and home page handlers

use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::template::{error_message, HomeTemplate, RenderHtml, SignInTemplate};
use super::view::SignInView;
use crate::auth::{callback_url::resolve_callback_url, AuthHandle, OptionalAuth, AUTH_BASE_PATH};
use crate::config::SigninConfig;
use crate::error::AuthError;

/// Query parameters of the sign-in page
#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    /// Where to land after sign-in
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
    /// Error code from a failed attempt
    pub error: Option<String>,
}

/// `GET /user/authentication`
///
/// Reads the anti-forgery token, the providers and the session together,
/// then redirects home when signed in or renders one button per provider.
/// A failed read fails the whole request.
pub async fn sign_in_page(
    State(auth): State<AuthHandle>,
    State(config): State<Arc<SigninConfig>>,
    Query(query): Query<SignInQuery>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let (csrf, providers, session) = tokio::try_join!(
        auth.csrf_token(&headers),
        auth.providers(),
        auth.session(&headers),
    )?;

    let view = SignInView::loaded(session.as_ref(), &providers);
    if let SignInView::Redirect(to) = view {
        tracing::debug!(to, "Already signed in");
        return Ok(Redirect::to(to).into_response());
    }

    let callback_url =
        resolve_callback_url(query.callback_url.as_deref(), auth.options().base_url());
    let session_url = format!("{AUTH_BASE_PATH}/session");
    let html = SignInTemplate {
        app_name: &config.server.app_name,
        buttons: view.buttons(),
        csrf_token: csrf.token.as_str(),
        callback_url: &callback_url,
        error: query.error.as_deref().map(error_message),
        session_url: &session_url,
        home: super::HOME_ROUTE,
    }
    .render_html()?;

    let cookie = auth.csrf_cookie(&csrf).map(|c| (SET_COOKIE, c));
    Ok((AppendHeaders(cookie), html).into_response())
}

/// `GET /`
pub async fn home(
    State(auth): State<AuthHandle>,
    State(config): State<Arc<SigninConfig>>,
    OptionalAuth(session): OptionalAuth,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let csrf = auth.csrf_token(&headers).await?;
    let signout_url = format!("{AUTH_BASE_PATH}/signout");

    let html = HomeTemplate {
        app_name: &config.server.app_name,
        user: session.as_ref().map(|s| s.display_name()),
        csrf_token: csrf.token.as_str(),
        signout_url: &signout_url,
        sign_in_url: &auth.options().pages().sign_in,
    }
    .render_html()?;

    let cookie = auth.csrf_cookie(&csrf).map(|c| (SET_COOKIE, c));
    Ok((AppendHeaders(cookie), html).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::adapter::{AdapterError, MemoryAdapter, MockAdapter};
    use crate::state::AppState;
    use crate::testing::{self, assert_redirect};
    use axum::{
        http::{header::COOKIE, HeaderValue, StatusCode},
        routing::get,
        Router,
    };
    use axum_test::TestServer;

    fn server(auth: AuthHandle) -> TestServer {
        let mut config = SigninConfig::default();
        config.server.app_name = "Example".into();
        let app = Router::new()
            .route("/user/authentication", get(sign_in_page))
            .with_state(AppState::new(config, auth));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_renders_buttons_and_sets_csrf_cookie() {
        let auth = testing::handle(
            Arc::new(MemoryAdapter::new()),
            vec![testing::github(), testing::google()],
        );
        let response = server(auth).get("/user/authentication").await;

        response.assert_status_ok();
        let html = response.text();
        assert_eq!(html.matches("data-provider-id=").count(), 2);
        assert!(html.contains("<title>Sign in | Example</title>"));
        assert!(html.contains("Continue with GitHub"));
        assert!(html.contains("Continue with Google"));
        assert!(testing::set_cookie(&response, "acton_signin.csrf_token").is_some());
    }

    #[tokio::test]
    async fn test_signed_in_visitor_is_sent_home() {
        let adapter = Arc::new(MemoryAdapter::new());
        let auth = testing::handle(adapter, vec![testing::github()]);
        let cookie = testing::signed_in(&auth, "Jane").await;

        let response = server(auth)
            .get("/user/authentication")
            .add_header(COOKIE, HeaderValue::from_str(&cookie).unwrap())
            .await;

        assert_redirect(&response, "/");
        assert!(!response.text().contains("Continue with"));
    }

    #[tokio::test]
    async fn test_error_code_is_explained() {
        let auth = testing::handle(Arc::new(MemoryAdapter::new()), Vec::new());
        let response = server(auth)
            .get("/user/authentication?error=OAuthAccountNotLinked")
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("sign in with the same account"));
    }

    #[tokio::test]
    async fn test_session_store_failure_fails_the_page() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_get_session_and_user()
            .returning(|_| Err(AdapterError::Backend("connection refused".into())));
        let auth = testing::handle(Arc::new(adapter), vec![testing::github()]);

        let response = server(auth)
            .get("/user/authentication")
            .add_header(
                COOKIE,
                HeaderValue::from_static("acton_signin.session_token=abc"),
            )
            .expect_failure()
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.text().contains("Continue with"));
    }
}
