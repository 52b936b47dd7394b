//! Shared OAuth2 provider logic
//!
//! `BaseOAuthProvider` wraps an oauth2 client built from an [`OAuthProvider`]
//! and the redirect URI of its callback route.

use chrono::Utc;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};

use crate::oauth2::http::async_http_client;
use crate::oauth2::types::{ConfiguredClient, OAuthError, OAuthProvider, OAuthToken};

const USER_AGENT: &str = concat!("acton-signin/", env!("CARGO_PKG_VERSION"));

/// Authorization redirect produced when a sign-in starts
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Provider authorization URL to redirect the browser to
    pub url: String,
    /// Random `state` parameter
    pub state: String,
    /// PKCE verifier, kept server side
    pub pkce_verifier: String,
}

/// Base OAuth2 provider containing the handshake logic
pub struct BaseOAuthProvider {
    client: ConfiguredClient,
    http_client: reqwest::Client,
    scopes: Vec<String>,
}

impl BaseOAuthProvider {
    /// Create a client for `provider` redirecting back to `redirect_uri`
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidConfig`] if any URL is invalid.
    pub fn new(provider: &OAuthProvider, redirect_uri: &str) -> Result<Self, OAuthError> {
        let client = BasicClient::new(ClientId::new(provider.credentials.client_id.clone()))
            .set_client_secret(ClientSecret::new(
                provider.credentials.client_secret.clone(),
            ))
            .set_auth_uri(
                AuthUrl::new(provider.auth_url.clone())
                    .map_err(|e| OAuthError::InvalidConfig(format!("auth URL: {e}")))?,
            )
            .set_token_uri(
                TokenUrl::new(provider.token_url.clone())
                    .map_err(|e| OAuthError::InvalidConfig(format!("token URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.to_string())
                    .map_err(|e| OAuthError::InvalidConfig(format!("redirect URI: {e}")))?,
            );

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OAuthError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            http_client,
            scopes: provider.scopes.clone(),
        })
    }

    /// Generate the authorization URL with PKCE and a random state
    #[must_use]
    pub fn authorization_url(&self) -> AuthorizationRequest {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_url_builder = self.client.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            auth_url_builder = auth_url_builder.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_state) = auth_url_builder.set_pkce_challenge(pkce_challenge).url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::TokenExchangeFailed`] if the token endpoint
    /// rejects the code or cannot be reached.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<OAuthToken, OAuthError> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&async_http_client)
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(OAuthToken {
            access_token: token_response.access_token().secret().clone(),
            refresh_token: token_response.refresh_token().map(|t| t.secret().clone()),
            expires_at: token_response
                .expires_in()
                .and_then(|duration| chrono::Duration::from_std(duration).ok())
                .map(|duration| Utc::now() + duration),
            scope: token_response.scopes().map(|scopes| {
                scopes
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
        })
    }

    /// GET a JSON document with the access token as bearer
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::UserInfoFailed`] on transport errors, non-success
    /// statuses and invalid JSON.
    pub async fn fetch_json(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<serde_json::Value, OAuthError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| OAuthError::UserInfoFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::UserInfoFailed(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::UserInfoFailed(format!("Failed to parse JSON: {e}")))
    }
}
