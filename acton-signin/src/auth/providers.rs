//! The closed set of provider kinds and their public descriptors

use serde::Serialize;

use super::credentials::{CredentialField, CredentialsProvider};
use crate::oauth2::OAuthProvider;

/// Route prefix of the authentication handler
pub const AUTH_BASE_PATH: &str = "/api/auth";

/// Kind of a provider, as exposed to the page and the JSON API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OAuth 2.0 redirect flow
    OAuth,
    /// Form posted to the callback route
    Credentials,
}

/// A configured identity provider
#[derive(Debug, Clone)]
pub enum Provider {
    /// OAuth 2.0 provider
    OAuth(OAuthProvider),
    /// Credentials provider
    Credentials(CredentialsProvider),
}

impl Provider {
    /// Provider id
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::OAuth(p) => &p.id,
            Self::Credentials(p) => &p.id,
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::OAuth(p) => &p.name,
            Self::Credentials(p) => &p.name,
        }
    }

    /// Provider kind
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::OAuth(_) => ProviderKind::OAuth,
            Self::Credentials(_) => ProviderKind::Credentials,
        }
    }

    /// Public description with routes relative to the site root
    #[must_use]
    pub fn descriptor(&self) -> ProviderDescriptor {
        let id = self.id();
        ProviderDescriptor {
            id: id.to_string(),
            name: self.name().to_string(),
            kind: self.kind(),
            signin_url: format!("{AUTH_BASE_PATH}/signin/{id}"),
            callback_url: format!("{AUTH_BASE_PATH}/callback/{id}"),
            fields: match self {
                Self::OAuth(_) => Vec::new(),
                Self::Credentials(p) => p.fields.clone(),
            },
        }
    }
}

/// What the sign-in page and `/api/auth/providers` know about a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    /// Provider id
    pub id: String,
    /// Display name
    pub name: String,
    /// Provider kind
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    /// Begin sign-in route
    #[serde(rename = "signinUrl")]
    pub signin_url: String,
    /// Callback route
    #[serde(rename = "callbackUrl")]
    pub callback_url: String,
    /// Form inputs, credentials providers only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<CredentialField>,
}

impl ProviderDescriptor {
    /// Route the provider's sign-in form posts to
    ///
    /// OAuth providers start at the sign-in route; credentials are submitted
    /// straight to the callback.
    #[must_use]
    pub fn form_action(&self) -> &str {
        match self.kind {
            ProviderKind::OAuth => &self.signin_url,
            ProviderKind::Credentials => &self.callback_url,
        }
    }
}

/// Whether `id` can be used as a route segment
#[must_use]
pub fn is_valid_provider_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}
