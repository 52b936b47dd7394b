//! Persistence of users, linked accounts and sessions
//!
//! The handler only talks to the [`Adapter`] trait. [`MemoryAdapter`] keeps
//! everything in process; [`PgAdapter`] stores it in Postgres using the
//! schema in `migrations/`.

mod memory;
mod postgres;

pub use memory::MemoryAdapter;
pub use postgres::PgAdapter;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Adapter errors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

/// Result alias for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Canonical form of an email address: trimmed and lowercased
///
/// Adapters store and look up emails in this form, so `Jane@Example.com`
/// and `jane@example.com` belong to the same user.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A stored user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterUser {
    /// User id
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Email address, unique (ignoring case) when present
    pub email: Option<String>,
    /// When the email was verified by a provider
    pub email_verified: Option<DateTime<Utc>>,
    /// Avatar URL
    pub image: Option<String>,
}

/// Fields of a user about to be created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// When the email was verified by a provider
    pub email_verified: Option<DateTime<Utc>>,
    /// Avatar URL
    pub image: Option<String>,
}

/// A provider account linked to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterAccount {
    /// Owning user
    pub user_id: String,
    /// Provider id
    pub provider: String,
    /// Account id at the provider
    pub provider_account_id: String,
    /// OAuth access token
    pub access_token: Option<String>,
    /// OAuth refresh token
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes
    pub scope: Option<String>,
}

/// A database session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSession {
    /// Opaque token stored in the session cookie
    pub session_token: String,
    /// Owning user
    pub user_id: String,
    /// Expiry
    pub expires: DateTime<Utc>,
}

/// Storage binding for users, accounts and sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Create a user and assign its id
    async fn create_user(&self, user: NewUser) -> AdapterResult<AdapterUser>;

    /// Look a user up by id
    async fn get_user(&self, id: &str) -> AdapterResult<Option<AdapterUser>>;

    /// Look a user up by email, ignoring case
    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<AdapterUser>>;

    /// Look up the user owning a provider account
    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<AdapterUser>>;

    /// Replace a user's profile fields
    async fn update_user(&self, user: AdapterUser) -> AdapterResult<AdapterUser>;

    /// Link a provider account to a user, replacing stored tokens if already linked
    async fn link_account(&self, account: AdapterAccount) -> AdapterResult<()>;

    /// Store a new session
    async fn create_session(&self, session: AdapterSession) -> AdapterResult<AdapterSession>;

    /// Load a session with its user
    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> AdapterResult<Option<(AdapterSession, AdapterUser)>>;

    /// Change a session's expiry; `None` if it no longer exists
    async fn update_session(&self, session: AdapterSession)
        -> AdapterResult<Option<AdapterSession>>;

    /// Delete a session; deleting an unknown token is not an error
    async fn delete_session(&self, session_token: &str) -> AdapterResult<()>;
}
