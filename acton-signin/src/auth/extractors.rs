//! Session extractors for Axum handlers
//!
//! ```rust,no_run
//! use acton_signin::auth::{OptionalAuth, Session};
//!
//! async fn greet(OptionalAuth(session): OptionalAuth) -> String {
//!     match session {
//!         Some(session) => format!("Hello, {}!", session.display_name()),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use super::handle::AuthHandle;
use super::session::Session;
use crate::error::AuthError;

/// Requires a session; redirects to the sign-in page otherwise
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    AuthHandle: FromRef<S>,
{
    type Rejection = AuthenticationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthHandle::from_ref(state);
        match auth.session(&parts.headers).await {
            Ok(Some(session)) => Ok(Self(session)),
            Ok(None) => Err(AuthenticationError::NotAuthenticated {
                sign_in: auth.options().pages().sign_in.clone(),
            }),
            Err(err) => Err(AuthenticationError::Lookup(err)),
        }
    }
}

/// The session if there is one
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Session>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    AuthHandle: FromRef<S>,
{
    type Rejection = AuthenticationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthHandle::from_ref(state);
        auth.session(&parts.headers)
            .await
            .map(Self)
            .map_err(AuthenticationError::Lookup)
    }
}

/// Extractor rejections
#[derive(Debug)]
pub enum AuthenticationError {
    /// No valid session
    NotAuthenticated {
        /// Where to send the browser
        sign_in: String,
    },

    /// The session could not be read
    Lookup(AuthError),
}

impl IntoResponse for AuthenticationError {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated { sign_in } => Redirect::to(&sign_in).into_response(),
            Self::Lookup(err) => err.into_response(),
        }
    }
}
