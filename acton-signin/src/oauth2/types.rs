//! OAuth2 types and configuration

use chrono::{DateTime, Utc};
use oauth2::{basic::BasicClient, EndpointNotSet, EndpointSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::CustomProviderSettings;
use crate::error::ConfigError;
use crate::oauth2::providers::{github, google};

/// Type alias for a fully configured OAuth2 client (oauth2 5.0 typestate)
///
/// Auth URL, token URL and redirect URI are set.
pub type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// How the userinfo response of a provider is normalised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStyle {
    /// `api.github.com/user`, with `/user/emails` fallback
    GitHub,
    /// Google OpenID Connect userinfo
    Google,
    /// Any provider returning `sub`/`id`, `email`, `name`, `picture`
    Generic,
}

/// Client id and secret of an OAuth application
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
}

impl ClientCredentials {
    /// Create credentials from explicit values
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read credentials through an environment lookup
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] naming the first variable
    /// that is absent.
    pub fn from_lookup(
        lookup: &dyn Fn(&str) -> Option<String>,
        provider: &str,
        id_var: &str,
        secret_var: &str,
    ) -> Result<Self, ConfigError> {
        let read = |variable: &str| {
            lookup(variable)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingCredential {
                    provider: provider.to_string(),
                    variable: variable.to_string(),
                })
        };

        Ok(Self {
            client_id: read(id_var)?,
            client_secret: read(secret_var)?,
        })
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

/// An OAuth 2.0 identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProvider {
    /// Provider id, used in `/api/auth/signin/{id}`
    pub id: String,
    /// Display name
    pub name: String,
    /// Application credentials
    pub credentials: ClientCredentials,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Userinfo endpoint
    pub userinfo_url: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Userinfo normalisation
    pub profile: ProfileStyle,
}

impl OAuthProvider {
    /// GitHub with the `read:user` and `user:email` scopes
    #[must_use]
    pub fn github(credentials: ClientCredentials) -> Self {
        github::provider(credentials)
    }

    /// Google with the `openid email profile` scopes
    #[must_use]
    pub fn google(credentials: ClientCredentials) -> Self {
        google::provider(credentials)
    }

    /// A provider declared in `[[auth.custom]]`
    #[must_use]
    pub fn custom(settings: &CustomProviderSettings, credentials: ClientCredentials) -> Self {
        Self {
            id: settings.id.clone(),
            name: settings.name.clone(),
            credentials,
            auth_url: settings.auth_url.clone(),
            token_url: settings.token_url.clone(),
            userinfo_url: settings.userinfo_url.clone(),
            scopes: settings.scopes.clone(),
            profile: ProfileStyle::Generic,
        }
    }
}

/// Tokens returned by a successful code exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Access token
    pub access_token: String,
    /// Refresh token, when the provider issues one
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes, space separated
    pub scope: Option<String>,
}

/// Normalised user profile from a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthUserInfo {
    /// Stable account id at the provider
    pub provider_user_id: String,
    /// Email address, if the provider disclosed one
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Avatar URL
    pub avatar_url: Option<String>,
    /// Whether the provider verified the email
    pub email_verified: bool,
}

/// OAuth2 errors
#[derive(Debug, Error)]
pub enum OAuthError {
    /// State parameter is unknown, already used, or bound to another provider
    #[error("invalid OAuth state")]
    InvalidState,

    /// Pending flow outlived its time-to-live
    #[error("OAuth state expired")]
    StateExpired,

    /// Provider redirected back with an error
    #[error("provider returned an error: {0}")]
    ProviderDenied(String),

    /// Provider endpoints cannot be used
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Token exchange failed
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Userinfo request failed
    #[error("failed to fetch user info: {0}")]
    UserInfoFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_credentials_from_lookup() {
        let env = lookup(&[("GITHUB_ID", "abc"), ("GITHUB_SECRET", "xyz")]);
        let creds = ClientCredentials::from_lookup(&env, "github", "GITHUB_ID", "GITHUB_SECRET")
            .unwrap();
        assert_eq!(creds.client_id, "abc");
        assert_eq!(creds.client_secret, "xyz");
    }

    #[test]
    fn test_missing_secret_is_reported() {
        let env = lookup(&[("GITHUB_ID", "abc")]);
        let err = ClientCredentials::from_lookup(&env, "github", "GITHUB_ID", "GITHUB_SECRET")
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCredential {
                provider: "github".into(),
                variable: "GITHUB_SECRET".into(),
            }
        );
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let env = lookup(&[("GOOGLE_CLIENT_ID", "  "), ("GOOGLE_CLIENT_SECRET", "s")]);
        let err = ClientCredentials::from_lookup(
            &env,
            "google",
            "GOOGLE_CLIENT_ID",
            "GOOGLE_CLIENT_SECRET",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { variable, .. } if variable == "GOOGLE_CLIENT_ID"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ClientCredentials::new("id", "very-secret");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("very-secret"));
    }

    #[test]
    fn test_custom_provider() {
        let settings = CustomProviderSettings {
            id: "gitlab".into(),
            name: "GitLab".into(),
            auth_url: "https://gitlab.com/oauth/authorize".into(),
            token_url: "https://gitlab.com/oauth/token".into(),
            userinfo_url: "https://gitlab.com/api/v4/user".into(),
            scopes: vec!["read_user".into()],
            client_id_env: "GITLAB_ID".into(),
            client_secret_env: "GITLAB_SECRET".into(),
        };
        let provider = OAuthProvider::custom(&settings, ClientCredentials::new("id", "secret"));
        assert_eq!(provider.id, "gitlab");
        assert_eq!(provider.profile, ProfileStyle::Generic);
        assert_eq!(provider.scopes, vec!["read_user"]);
    }
}
