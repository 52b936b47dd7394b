//! Error types and error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::{AdapterError, CredentialsError};
use crate::oauth2::OAuthError;

/// Startup configuration error
///
/// Every variant is fatal: the binary refuses to serve with an invalid
/// [`AuthOptions`](crate::auth::AuthOptions).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A provider is enabled but its client id or secret is not set
    #[error("provider '{provider}' is enabled but {variable} is not set")]
    MissingCredential {
        /// Provider id
        provider: String,
        /// Environment variable that was empty or absent
        variable: String,
    },

    /// No anti-forgery secret was configured
    #[error("no secret configured (set security.secret or AUTH_SECRET)")]
    MissingSecret,

    /// No persistence adapter was supplied
    #[error("no adapter configured")]
    MissingAdapter,

    /// Two providers share the same id
    #[error("duplicate provider id '{0}'")]
    DuplicateProvider(String),

    /// A provider id is not known and has no `[[auth.custom]]` entry
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// A provider id contains characters that cannot appear in a route
    #[error("invalid provider id '{0}': use lowercase letters, digits, '-' or '_'")]
    InvalidProviderId(String),

    /// The credentials provider is enabled without a verifier
    #[error("provider '{0}' needs a credentials verifier")]
    MissingVerifier(String),

    /// A configured URL does not parse
    #[error("invalid {what} '{value}'")]
    InvalidUrl {
        /// Which setting held the URL
        what: String,
        /// The rejected value
        value: String,
    },

    /// The sign-in page route is not an absolute path
    #[error("sign-in page must be an absolute path, got '{0}'")]
    InvalidPage(String),
}

/// Request-scoped authentication error
#[derive(Debug, Error)]
pub enum AuthError {
    /// Submitted anti-forgery token is missing or does not match the cookie
    #[error("invalid or missing anti-forgery token")]
    Csrf,

    /// No provider with this id is configured
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// Callback request is malformed or does not match a pending flow
    #[error("invalid callback: {0}")]
    InvalidCallback(String),

    /// OAuth handshake with the provider failed
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Persistence failure
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Credentials verification failed unexpectedly
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// The profile email belongs to a user signed up with another provider
    #[error("account is not linked to the existing user with this email")]
    AccountNotLinked,

    /// Template rendering failed
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

impl AuthError {
    /// Error code passed to the sign-in page as `?error=`
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::OAuth(_) => "OAuthCallback",
            Self::AccountNotLinked => "OAuthAccountNotLinked",
            Self::InvalidCallback(_) => "Callback",
            Self::Credentials(_) => "CredentialsSignin",
            Self::Csrf => "Verification",
            Self::UnknownProvider(_) | Self::Adapter(_) | Self::Template(_) => "Default",
        }
    }

    /// HTTP status used when the error is returned directly
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Csrf => StatusCode::FORBIDDEN,
            Self::UnknownProvider(_) => StatusCode::NOT_FOUND,
            Self::InvalidCallback(_) => StatusCode::BAD_REQUEST,
            Self::OAuth(_) => StatusCode::BAD_GATEWAY,
            Self::AccountNotLinked => StatusCode::CONFLICT,
            Self::Adapter(_) | Self::Credentials(_) | Self::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication request failed");
            // internals stay in the log
            return (status, "Internal server error").into_response();
        }

        tracing::warn!(error = %self, "Authentication request rejected");
        (status, self.to_string()).into_response()
    }
}
