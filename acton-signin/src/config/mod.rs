//! Configuration management for acton-signin
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_SIGNIN_` prefix)
//! 2. `./config.toml` (development)
//! 3. `~/.config/acton-signin/{service_name}/config.toml` (user config, XDG)
//! 4. `/etc/acton-signin/{service_name}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Provider client secrets are never part of this file. They are read from the
//! process environment when [`AuthOptions`](crate::auth::AuthOptions) is built.
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [server]
//! bind = "0.0.0.0:3000"
//! base_url = "https://app.example.com"
//! app_name = "Example"
//!
//! [security]
//! session_max_age_secs = 2592000
//! secure_cookies = true
//! same_site = "lax"
//!
//! [auth]
//! providers = ["github", "google", "gitlab"]
//! sign_in_page = "/user/authentication"
//!
//! [[auth.custom]]
//! id = "gitlab"
//! name = "GitLab"
//! auth_url = "https://gitlab.com/oauth/authorize"
//! token_url = "https://gitlab.com/oauth/token"
//! userinfo_url = "https://gitlab.com/api/v4/user"
//! scopes = ["read_user"]
//! client_id_env = "GITLAB_ID"
//! client_secret_env = "GITLAB_SECRET"
//!
//! # enables the "credentials" provider when listed above;
//! # hashes come from `acton-signin hash-password`
//! [[auth.users]]
//! username = "jsmith"
//! password_hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
//! name = "J Smith"
//!
//! [database]
//! url = "postgres://localhost/signin"
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use acton_signin::config::SigninConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = SigninConfig::load_for_service("my-app")?;
//! let bind = &config.server.bind;
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default route of the sign-in page
pub const DEFAULT_SIGN_IN_PAGE: &str = "/user/authentication";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on
    pub bind: String,

    /// Public origin of the application, used to build OAuth redirect URIs
    pub base_url: String,

    /// Application name shown in page titles
    pub app_name: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            base_url: "http://localhost:3000".to_string(),
            app_name: "acton-signin".to_string(),
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Session maximum age in seconds
    pub session_max_age_secs: u64,

    /// Enable secure cookies (HTTPS only)
    pub secure_cookies: bool,

    /// Cookie SameSite policy
    pub same_site: SameSitePolicy,

    /// Secret mixed into the anti-forgery cookie hash.
    /// Falls back to the `AUTH_SECRET` environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            session_max_age_secs: 30 * 24 * 60 * 60,
            secure_cookies: !cfg!(debug_assertions),
            same_site: SameSitePolicy::Lax,
            secret: None,
        }
    }
}

/// Cookie SameSite policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    /// Strict SameSite policy
    Strict,
    /// Lax SameSite policy (required for OAuth callbacks to carry cookies)
    Lax,
    /// None SameSite policy (requires secure cookies)
    None,
}

impl SameSitePolicy {
    /// Value used in the `SameSite` cookie attribute
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// A generic OAuth 2.0 provider declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProviderSettings {
    /// Provider id, used in `/api/auth/signin/{id}`
    pub id: String,

    /// Display name shown on the sign-in button
    pub name: String,

    /// Authorization endpoint
    pub auth_url: String,

    /// Token endpoint
    pub token_url: String,

    /// Userinfo endpoint returning a JSON profile
    pub userinfo_url: String,

    /// Requested scopes
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Environment variable holding the client id
    pub client_id_env: String,

    /// Environment variable holding the client secret
    pub client_secret_env: String,
}

/// A local username/password account for the credentials provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUserSettings {
    /// Login name
    pub username: String,

    /// Argon2 hash in PHC string format
    pub password_hash: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl std::fmt::Debug for LocalUserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalUserSettings")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Enabled provider ids, in the order their buttons are rendered
    pub providers: Vec<String>,

    /// Route of the sign-in page
    pub sign_in_page: String,

    /// Generic OAuth providers
    pub custom: Vec<CustomProviderSettings>,

    /// Local accounts checked by the credentials provider
    pub users: Vec<LocalUserSettings>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            providers: vec!["github".to_string(), "google".to_string()],
            sign_in_page: DEFAULT_SIGN_IN_PAGE.to_string(),
            custom: Vec::new(),
            users: Vec::new(),
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Postgres connection string. The in-memory adapter is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

/// Complete acton-signin configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SigninConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Security settings
    #[serde(default)]
    pub security: SecuritySettings,

    /// Authentication settings
    #[serde(default)]
    pub auth: AuthSettings,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl SigninConfig {
    /// Load configuration for a specific service
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file cannot be parsed or a value
    /// has the wrong type.
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(&toml::to_string(&Self::default())?));

        let system_config = PathBuf::from("/etc/acton-signin")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Env::prefixed("ACTON_SIGNIN_").split("__").lowercase(true));

        Ok(figment.extract()?)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file yields the defaults (plus environment overrides).
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or a value has the
    /// wrong type.
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ACTON_SIGNIN_").split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("acton-signin")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}
