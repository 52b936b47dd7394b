//! Application state
//!
//! Configuration and the authentication handle are built once at startup
//! and injected here; handlers pull what they need through `FromRef`.

use axum::extract::FromRef;
use std::sync::Arc;

use crate::auth::AuthHandle;
use crate::config::SigninConfig;

/// State shared by every route
///
/// # Example
///
/// ```rust,no_run
/// use acton_signin::{auth::{AuthHandle, AuthOptions, MemoryAdapter}, config::SigninConfig, state::AppState};
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let options = AuthOptions::builder()
///     .adapter(Arc::new(MemoryAdapter::new()))
///     .secret("change-me")
///     .build()?;
/// let state = AppState::new(SigninConfig::default(), AuthHandle::new(options));
/// let app = acton_signin::router(state);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<SigninConfig>,
    auth: AuthHandle,
}

impl AppState {
    /// Bundle configuration and the authentication handle
    #[must_use]
    pub fn new(config: SigninConfig, auth: AuthHandle) -> Self {
        Self {
            config: Arc::new(config),
            auth,
        }
    }

    /// Loaded configuration
    #[must_use]
    pub fn config(&self) -> &SigninConfig {
        &self.config
    }

    /// Authentication handle
    #[must_use]
    pub const fn auth(&self) -> &AuthHandle {
        &self.auth
    }
}

impl FromRef<AppState> for AuthHandle {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<SigninConfig> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.config)
    }
}
