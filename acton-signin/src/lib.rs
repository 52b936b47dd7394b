//! acton-signin: provider sign-in for Axum applications
//!
//! Two pieces share one immutable configuration value:
//!
//! - **Authentication handler** (`/api/auth/*`): OAuth providers (GitHub,
//!   Google, any OAuth 2.0 endpoint set) and an optional credentials
//!   provider, wired into database sessions through a pluggable
//!   [`auth::Adapter`].
//! - **Sign-in page** (`/user/authentication`): one "Continue with ..."
//!   button per provider; visitors with a session are sent to `/`.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_signin::auth::{env_lookup, AuthHandle, AuthOptions, MemoryAdapter};
//! use acton_signin::{config::SigninConfig, state::AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     acton_signin::observability::init()?;
//!
//!     let config = SigninConfig::load_for_service("acton-signin")?;
//!     // Fails when GITHUB_ID, GOOGLE_CLIENT_SECRET, ... are missing
//!     let options =
//!         AuthOptions::from_config(&config, Arc::new(MemoryAdapter::new()), None, env_lookup)?;
//!
//!     let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
//!     let app = acton_signin::router(AppState::new(config, AuthHandle::new(options)));
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! See [`config::SigninConfig`] for the layered `config.toml` /
//! `ACTON_SIGNIN_*` settings.

#![allow(clippy::missing_errors_doc)]

pub mod auth;
pub mod config;
pub mod error;
pub mod oauth2;
pub mod observability;
pub mod page;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AUTH_BASE_PATH;
use crate::state::AppState;

/// Build the application router
///
/// Serves the sign-in page at the configured `pages.sign_in` route, the
/// authentication handler under `/api/auth` and the home page at `/`.
pub fn router(state: AppState) -> Router {
    let sign_in = state.auth().options().pages().sign_in.clone();

    Router::new()
        .route(page::HOME_ROUTE, get(page::home))
        .route(&sign_in, get(page::sign_in_page))
        .nest(AUTH_BASE_PATH, auth::handler::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod prelude {
    //! Convenience re-exports
    //!
    //! ```rust
    //! use acton_signin::prelude::*;
    //! ```

    pub use crate::auth::{
        env_lookup, Adapter, AuthHandle, AuthOptions, Authenticated, CredentialsProvider,
        CredentialsVerifier, MemoryAdapter, OptionalAuth, PgAdapter, Provider, Session,
    };
    pub use crate::config::SigninConfig;
    pub use crate::error::{AuthError, ConfigError};
    pub use crate::oauth2::{ClientCredentials, OAuthProvider};
    pub use crate::state::AppState;

    pub use askama;
    pub use axum;
}
