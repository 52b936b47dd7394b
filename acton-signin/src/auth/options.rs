//! Authentication options: providers, adapter and page routes
//!
//! [`AuthOptions`] is built once at startup, either through
//! [`AuthOptions::builder`] or from a [`SigninConfig`] plus the process
//! environment, and shared read-only afterwards.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use acton_signin::auth::{env_lookup, AuthOptions, MemoryAdapter};
//! use acton_signin::config::SigninConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = SigninConfig::load_for_service("my-app")?;
//! let options = AuthOptions::from_config(&config, Arc::new(MemoryAdapter::new()), None, env_lookup)?;
//! # Ok(())
//! # }
//! ```

use chrono::Duration;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::adapter::Adapter;
use super::cookies::CookieSettings;
use super::credentials::{CredentialsProvider, CredentialsVerifier};
use super::providers::{is_valid_provider_id, Provider, ProviderDescriptor, AUTH_BASE_PATH};
use super::session::SessionOptions;
use crate::config::{SigninConfig, DEFAULT_SIGN_IN_PAGE};
use crate::error::ConfigError;
use crate::oauth2::providers::{github, google};
use crate::oauth2::{ClientCredentials, OAuthProvider};
use crate::page::HOME_ROUTE;

/// Environment variable consulted when no secret is configured
pub const SECRET_ENV: &str = "AUTH_SECRET";

/// Read a variable from the process environment
#[must_use]
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Route overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    /// Sign-in page; unauthenticated flows redirect here
    pub sign_in: String,
}

impl Default for Pages {
    fn default() -> Self {
        Self {
            sign_in: DEFAULT_SIGN_IN_PAGE.to_string(),
        }
    }
}

/// Immutable authentication configuration
#[derive(Clone)]
pub struct AuthOptions {
    providers: Vec<Provider>,
    adapter: Arc<dyn Adapter>,
    pages: Pages,
    secret: String,
    base_url: String,
    session: SessionOptions,
    cookies: CookieSettings,
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthOptions")
            .field("providers", &self.providers)
            .field("pages", &self.pages)
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

impl AuthOptions {
    /// Start building options
    #[must_use]
    pub fn builder() -> AuthOptionsBuilder {
        AuthOptionsBuilder::default()
    }

    /// Build options from configuration and an environment lookup
    ///
    /// Providers are enabled in the order of `auth.providers`. Client ids and
    /// secrets come from `lookup`: `GITHUB_ID`/`GITHUB_SECRET`,
    /// `GOOGLE_CLIENT_ID`/`GOOGLE_CLIENT_SECRET`, or the variables named by a
    /// `[[auth.custom]]` entry. `credentials` needs `verifier`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn from_config(
        config: &SigninConfig,
        adapter: Arc<dyn Adapter>,
        verifier: Option<Arc<dyn CredentialsVerifier>>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::builder()
            .adapter(adapter)
            .base_url(&config.server.base_url)
            .sign_in_page(&config.auth.sign_in_page)
            .session_max_age(
                i64::try_from(config.security.session_max_age_secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .unwrap_or_else(|| SessionOptions::default().max_age),
            )
            .cookies(CookieSettings {
                secure: config.security.secure_cookies,
                same_site: config.security.same_site,
                path: "/".to_string(),
            });

        if let Some(secret) = config.security.secret.clone().or_else(|| lookup(SECRET_ENV)) {
            builder = builder.secret(secret);
        }

        for id in &config.auth.providers {
            let provider = if let Some(custom) = config.auth.custom.iter().find(|c| &c.id == id) {
                let credentials = ClientCredentials::from_lookup(
                    &lookup,
                    id,
                    &custom.client_id_env,
                    &custom.client_secret_env,
                )?;
                Provider::OAuth(OAuthProvider::custom(custom, credentials))
            } else {
                match id.as_str() {
                    "github" => Provider::OAuth(OAuthProvider::github(
                        ClientCredentials::from_lookup(
                            &lookup,
                            id,
                            github::CLIENT_ID_ENV,
                            github::CLIENT_SECRET_ENV,
                        )?,
                    )),
                    "google" => Provider::OAuth(OAuthProvider::google(
                        ClientCredentials::from_lookup(
                            &lookup,
                            id,
                            google::CLIENT_ID_ENV,
                            google::CLIENT_SECRET_ENV,
                        )?,
                    )),
                    "credentials" => {
                        let verifier = verifier
                            .clone()
                            .ok_or_else(|| ConfigError::MissingVerifier(id.clone()))?;
                        Provider::Credentials(CredentialsProvider::new(verifier))
                    }
                    other => return Err(ConfigError::UnknownProvider(other.to_string())),
                }
            };
            builder = builder.provider(provider);
        }

        builder.build()
    }

    /// Providers in configuration order
    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Look a provider up by id
    #[must_use]
    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Public descriptors in configuration order
    #[must_use]
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.providers.iter().map(Provider::descriptor).collect()
    }

    /// Storage binding
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    /// Route overrides
    #[must_use]
    pub const fn pages(&self) -> &Pages {
        &self.pages
    }

    /// Secret for the anti-forgery cookie hash
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Public origin, without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session lifetime settings
    #[must_use]
    pub const fn session(&self) -> &SessionOptions {
        &self.session
    }

    /// Cookie attributes
    #[must_use]
    pub const fn cookies(&self) -> &CookieSettings {
        &self.cookies
    }

    /// Absolute OAuth redirect URI of a provider
    #[must_use]
    pub fn redirect_uri(&self, provider_id: &str) -> String {
        format!("{}{AUTH_BASE_PATH}/callback/{provider_id}", self.base_url)
    }

    /// Sign-in page URL carrying an error code
    #[must_use]
    pub fn sign_in_error_url(&self, code: &str) -> String {
        format!("{}?error={code}", self.pages.sign_in)
    }
}

/// Builder for [`AuthOptions`]
#[derive(Default)]
pub struct AuthOptionsBuilder {
    providers: Vec<Provider>,
    adapter: Option<Arc<dyn Adapter>>,
    sign_in_page: Option<String>,
    secret: Option<String>,
    base_url: Option<String>,
    session: SessionOptions,
    cookies: CookieSettings,
}

impl AuthOptionsBuilder {
    /// Append a provider
    #[must_use]
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Set the storage binding
    #[must_use]
    pub fn adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Override the sign-in page route
    #[must_use]
    pub fn sign_in_page(mut self, path: impl Into<String>) -> Self {
        self.sign_in_page = Some(path.into());
        self
    }

    /// Set the anti-forgery secret
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the public origin
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the session lifetime
    #[must_use]
    pub fn session_max_age(mut self, max_age: Duration) -> Self {
        self.session.max_age = max_age;
        self
    }

    /// Set cookie attributes
    #[must_use]
    pub fn cookies(mut self, cookies: CookieSettings) -> Self {
        self.cookies = cookies;
        self
    }

    /// Validate and freeze the options
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingAdapter`] / [`ConfigError::MissingSecret`]
    /// - [`ConfigError::InvalidProviderId`] / [`ConfigError::DuplicateProvider`]
    /// - [`ConfigError::InvalidUrl`] for the base URL or provider endpoints
    /// - [`ConfigError::InvalidPage`] if the sign-in route is not a plain
    ///   absolute path, is the home route or lies under `/api/auth`
    pub fn build(self) -> Result<AuthOptions, ConfigError> {
        let adapter = self.adapter.ok_or(ConfigError::MissingAdapter)?;
        let secret = self
            .secret
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        check_url("base URL", &base_url)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let sign_in = self
            .sign_in_page
            .unwrap_or_else(|| DEFAULT_SIGN_IN_PAGE.to_string());
        if !is_valid_page_route(&sign_in) {
            return Err(ConfigError::InvalidPage(sign_in));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            let id = provider.id();
            if !is_valid_provider_id(id) {
                return Err(ConfigError::InvalidProviderId(id.to_string()));
            }
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateProvider(id.to_string()));
            }
            if let Provider::OAuth(oauth) = provider {
                check_url(&format!("{id} authorization URL"), &oauth.auth_url)?;
                check_url(&format!("{id} token URL"), &oauth.token_url)?;
                check_url(&format!("{id} userinfo URL"), &oauth.userinfo_url)?;
            }
        }

        Ok(AuthOptions {
            providers: self.providers,
            adapter,
            pages: Pages { sign_in },
            secret,
            base_url,
            session: self.session,
            cookies: self.cookies,
        })
    }
}

// A literal path axum can route next to the home page and the auth API
fn is_valid_page_route(path: &str) -> bool {
    let under_auth_api = path == AUTH_BASE_PATH
        || path
            .strip_prefix(AUTH_BASE_PATH)
            .is_some_and(|rest| rest.starts_with('/'));

    path.starts_with('/')
        && !path.starts_with("//")
        && path != HOME_ROUTE
        && !under_auth_api
        && !path.chars().any(|c| {
            c.is_control() || c.is_whitespace() || matches!(c, '*' | '{' | '}' | '?' | '#' | '\\')
        })
}

fn check_url(what: &str, value: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            what: what.to_string(),
            value: value.to_string(),
        }),
    }
}
