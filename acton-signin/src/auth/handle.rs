//! Shared handle to the authentication runtime
//!
//! `AuthHandle` is what request handlers hold: the immutable [`AuthOptions`]
//! and the store of pending OAuth flows. Its read API (`csrf_token`,
//! `providers`, `session`) is what the sign-in page gathers before rendering.

use axum::{
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use std::sync::Arc;

use super::adapter::{AdapterSession, AdapterUser};
use super::cookies::{is_state_token, read_cookie, state_cookie_name, CSRF_COOKIE, SESSION_COOKIE};
use super::csrf::{self, CsrfIssue};
use super::options::AuthOptions;
use super::providers::ProviderDescriptor;
use super::session::{new_session_token, Session};
use crate::error::AuthError;
use crate::oauth2::FlowStore;

/// Cheaply clonable handle to the authentication runtime
#[derive(Debug, Clone)]
pub struct AuthHandle {
    options: Arc<AuthOptions>,
    flows: Arc<FlowStore>,
}

impl AuthHandle {
    /// Wrap options with an empty flow store
    #[must_use]
    pub fn new(options: AuthOptions) -> Self {
        Self::with_flow_store(options, FlowStore::default())
    }

    /// Wrap options with a specific flow store
    #[must_use]
    pub fn with_flow_store(options: AuthOptions, flows: FlowStore) -> Self {
        Self {
            options: Arc::new(options),
            flows: Arc::new(flows),
        }
    }

    /// Authentication options
    #[must_use]
    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    /// Pending OAuth flows
    #[must_use]
    pub fn flows(&self) -> &FlowStore {
        &self.flows
    }

    /// Anti-forgery token for this browser
    ///
    /// # Errors
    ///
    /// Infallible today; the signature matches the other page reads.
    pub async fn csrf_token(&self, headers: &HeaderMap) -> Result<CsrfIssue, AuthError> {
        Ok(csrf::issue(
            read_cookie(headers, CSRF_COOKIE),
            self.options.secret(),
        ))
    }

    /// Enabled providers in configuration order
    ///
    /// # Errors
    ///
    /// Infallible today; the signature matches the other page reads.
    pub async fn providers(&self) -> Result<Vec<ProviderDescriptor>, AuthError> {
        Ok(self.options.descriptors())
    }

    /// The current session, if the session cookie names a live one
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Adapter`] if the session store fails.
    pub async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        Ok(self
            .load_session(headers)
            .await?
            .map(|(session, user)| Session::from_parts(&session, &user)))
    }

    /// The current session, sliding its expiry forward when due
    ///
    /// Returns the session and, when it was extended, the refreshed cookie.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Adapter`] if the session store fails.
    pub async fn touch_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<(Session, Option<String>)>, AuthError> {
        let Some((session, user)) = self.load_session(headers).await? else {
            return Ok(None);
        };

        let options = self.options.session();
        let now = Utc::now();
        if !options.needs_refresh(session.expires, now) {
            return Ok(Some((Session::from_parts(&session, &user), None)));
        }

        let extended = AdapterSession {
            expires: now + options.max_age,
            ..session
        };
        let Some(updated) = self.options.adapter().update_session(extended).await? else {
            return Ok(None);
        };

        let cookie = self.options.cookies().build(
            SESSION_COOKIE,
            &updated.session_token,
            Some(options.max_age_secs()),
        );
        Ok(Some((Session::from_parts(&updated, &user), Some(cookie))))
    }

    /// Id of the signed-in user, if any
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Adapter`] if the session store fails.
    pub async fn current_user_id(&self, headers: &HeaderMap) -> Result<Option<String>, AuthError> {
        Ok(self.load_session(headers).await?.map(|(_, user)| user.id))
    }

    async fn load_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<(AdapterSession, AdapterUser)>, AuthError> {
        let Some(token) = read_cookie(headers, SESSION_COOKIE) else {
            return Ok(None);
        };

        let adapter = self.options.adapter();
        match adapter.get_session_and_user(token).await? {
            Some((session, _)) if session.expires <= Utc::now() => {
                adapter.delete_session(token).await?;
                tracing::debug!("Expired session removed");
                Ok(None)
            }
            found => Ok(found),
        }
    }

    /// Store a new session for `user_id` and return its `Set-Cookie` value
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Adapter`] if the session cannot be stored.
    pub async fn create_session(&self, user_id: &str) -> Result<String, AuthError> {
        let options = self.options.session();
        let session = self
            .options
            .adapter()
            .create_session(AdapterSession {
                session_token: new_session_token(),
                user_id: user_id.to_string(),
                expires: Utc::now() + options.max_age,
            })
            .await?;

        tracing::debug!(user_id, "Session created");
        Ok(self.options.cookies().build(
            SESSION_COOKIE,
            &session.session_token,
            Some(options.max_age_secs()),
        ))
    }

    /// `Set-Cookie` value for a newly minted anti-forgery token
    #[must_use]
    pub fn csrf_cookie(&self, issue: &CsrfIssue) -> Option<String> {
        issue
            .cookie_value
            .as_deref()
            .map(|value| self.options.cookies().build(CSRF_COOKIE, value, None))
    }

    /// Check a submitted anti-forgery token
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Csrf`] if it does not match the cookie.
    pub fn verify_csrf(&self, headers: &HeaderMap, submitted: Option<&str>) -> Result<(), AuthError> {
        if csrf::verify_submission(
            read_cookie(headers, CSRF_COOKIE),
            submitted,
            self.options.secret(),
        ) {
            Ok(())
        } else {
            tracing::warn!("Anti-forgery token rejected");
            Err(AuthError::Csrf)
        }
    }

    /// Turn a failed callback into a response
    ///
    /// Handshake failures send the browser back to the sign-in page with an
    /// error code so the user can try again; everything else is answered
    /// directly. The cookie of the failed OAuth flow, if any, is cleared.
    #[must_use]
    pub fn callback_failure(
        &self,
        provider_id: &str,
        state: Option<&str>,
        err: AuthError,
    ) -> Response {
        match err {
            AuthError::OAuth(_)
            | AuthError::AccountNotLinked
            | AuthError::InvalidCallback(_)
            | AuthError::Credentials(_) => {
                tracing::warn!(provider = %provider_id, error = %err, "Sign-in failed");
                let expire_state = state.filter(|s| is_state_token(s)).map(|state| {
                    let name = state_cookie_name(state);
                    (SET_COOKIE, self.options.cookies().expire(&name))
                });
                (
                    AppendHeaders(expire_state),
                    Redirect::to(&self.options.sign_in_error_url(err.code())),
                )
                    .into_response()
            }
            other => other.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::adapter::{Adapter, AdapterError, MemoryAdapter, MockAdapter, NewUser};
    use crate::auth::cookies::CookieSettings;
    use axum::http::{header::COOKIE, HeaderValue, StatusCode};
    use chrono::Duration;

    fn options(adapter: Arc<dyn Adapter>) -> AuthOptions {
        AuthOptions::builder()
            .adapter(adapter)
            .secret("test-secret")
            .cookies(CookieSettings {
                secure: false,
                ..CookieSettings::default()
            })
            .build()
            .unwrap()
    }

    fn with_session_cookie(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
        );
        headers
    }

    fn token_from(cookie: &str) -> &str {
        cookie
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, value)| value)
            .unwrap()
    }

    #[tokio::test]
    async fn test_no_cookie_means_no_session() {
        let handle = AuthHandle::new(options(Arc::new(MemoryAdapter::new())));
        assert!(handle.session(&HeaderMap::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_created_session_is_readable() {
        let adapter = Arc::new(MemoryAdapter::new());
        let user = adapter
            .create_user(NewUser {
                name: Some("Jane".into()),
                ..NewUser::default()
            })
            .await
            .unwrap();
        let handle = AuthHandle::new(options(adapter));

        let cookie = handle.create_session(&user.id).await.unwrap();
        assert!(cookie.starts_with(SESSION_COOKIE));
        assert!(cookie.contains("Max-Age=2592000"));

        let session = handle
            .session(&with_session_cookie(token_from(&cookie)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.user.name.as_deref(), Some("Jane"));
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let adapter = Arc::new(MemoryAdapter::new());
        let user = adapter.create_user(NewUser::default()).await.unwrap();
        adapter
            .create_session(AdapterSession {
                session_token: "old".into(),
                user_id: user.id,
                expires: Utc::now() - Duration::minutes(1),
            })
            .await
            .unwrap();
        let handle = AuthHandle::new(options(adapter.clone()));

        assert!(handle.session(&with_session_cookie("old")).await.unwrap().is_none());
        assert_eq!(adapter.session_count(), 0);
    }

    #[tokio::test]
    async fn test_touch_extends_stale_session() {
        let adapter = Arc::new(MemoryAdapter::new());
        let user = adapter.create_user(NewUser::default()).await.unwrap();
        let stale = Utc::now() + Duration::days(10);
        adapter
            .create_session(AdapterSession {
                session_token: "tok".into(),
                user_id: user.id,
                expires: stale,
            })
            .await
            .unwrap();
        let handle = AuthHandle::new(options(adapter));

        let (session, cookie) = handle
            .touch_session(&with_session_cookie("tok"))
            .await
            .unwrap()
            .unwrap();
        assert!(session.expires > stale);
        assert!(cookie.unwrap().starts_with("acton_signin.session_token=tok;"));
    }

    #[tokio::test]
    async fn test_adapter_failure_is_an_error() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_get_session_and_user()
            .returning(|_| Err(AdapterError::Backend("connection refused".into())));
        let handle = AuthHandle::new(options(Arc::new(adapter)));

        let result = handle.session(&with_session_cookie("tok")).await;
        assert!(matches!(result, Err(AuthError::Adapter(_))));
    }

    #[tokio::test]
    async fn test_csrf_round_trip() {
        let handle = AuthHandle::new(options(Arc::new(MemoryAdapter::new())));
        let issue = handle.csrf_token(&HeaderMap::new()).await.unwrap();
        let cookie = handle.csrf_cookie(&issue).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{CSRF_COOKIE}={}", token_from(&cookie))).unwrap(),
        );

        assert!(handle.verify_csrf(&headers, Some(issue.token.as_str())).is_ok());
        assert!(matches!(
            handle.verify_csrf(&headers, Some("forged")),
            Err(AuthError::Csrf)
        ));

        // a valid cookie is reused rather than replaced
        let again = handle.csrf_token(&headers).await.unwrap();
        assert_eq!(again.token, issue.token);
        assert!(handle.csrf_cookie(&again).is_none());
    }

    #[test]
    fn test_callback_failure_redirects_with_code() {
        let handle = AuthHandle::new(options(Arc::new(MemoryAdapter::new())));
        let response = handle.callback_failure("github", Some("abc"), AuthError::AccountNotLinked);

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/user/authentication?error=OAuthAccountNotLinked"
        );
        assert!(response.headers()["set-cookie"]
            .to_str()
            .unwrap()
            .starts_with("acton_signin.state.abc=; "));
    }

    #[test]
    fn test_callback_failure_ignores_malformed_state() {
        let handle = AuthHandle::new(options(Arc::new(MemoryAdapter::new())));
        let response = handle.callback_failure(
            "github",
            Some("x; Path=/evil"),
            AuthError::InvalidCallback("missing code".into()),
        );

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().get("set-cookie").is_none());
    }

    #[test]
    fn test_callback_failure_passes_csrf_through() {
        let handle = AuthHandle::new(options(Arc::new(MemoryAdapter::new())));
        let response = handle.callback_failure("credentials", None, AuthError::Csrf);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
