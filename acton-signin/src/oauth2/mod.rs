//! OAuth2 authentication module
//!
//! - GitHub and Google providers, plus generic OAuth 2.0 providers
//! - PKCE (S256) and a random `state` on every authorization request
//! - Pending flows kept server side for ten minutes
//!
//! Routes live in [`crate::auth::handler`]; this module only knows how to talk
//! to providers.

pub mod flow;
pub mod http;
pub mod providers;
pub mod types;

pub use flow::{FlowStore, PendingFlow, FLOW_TTL};
pub use providers::{AuthorizationRequest, BaseOAuthProvider};
pub use types::{
    ClientCredentials, OAuthError, OAuthProvider, OAuthToken, OAuthUserInfo, ProfileStyle,
};
