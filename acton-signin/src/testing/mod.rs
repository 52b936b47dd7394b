//! Fixtures for unit tests
//!
//! Builds [`AuthHandle`]s over a given adapter and signs users in without
//! going through a provider.

pub mod assertions;

pub use assertions::*;

use std::sync::Arc;

use crate::auth::{
    adapter::{Adapter, NewUser},
    cookies::CookieSettings,
    AuthHandle, AuthOptions, Provider,
};
use crate::oauth2::{ClientCredentials, OAuthProvider};

/// Anti-forgery secret used by every fixture
pub const TEST_SECRET: &str = "test-secret";

/// GitHub provider with dummy credentials
pub fn github() -> Provider {
    Provider::OAuth(OAuthProvider::github(ClientCredentials::new(
        "github-client",
        "github-secret",
    )))
}

/// Google provider with dummy credentials
pub fn google() -> Provider {
    Provider::OAuth(OAuthProvider::google(ClientCredentials::new(
        "google-client",
        "google-secret",
    )))
}

/// Handle with plain-HTTP cookies and the given providers
pub fn handle(adapter: Arc<dyn Adapter>, providers: Vec<Provider>) -> AuthHandle {
    let options = providers
        .into_iter()
        .fold(AuthOptions::builder(), |builder, p| builder.provider(p))
        .adapter(adapter)
        .secret(TEST_SECRET)
        .cookies(CookieSettings {
            secure: false,
            ..CookieSettings::default()
        })
        .build()
        .unwrap();
    AuthHandle::new(options)
}

/// Create a user named `name` with a live session; returns the `Cookie` pair
pub async fn signed_in(auth: &AuthHandle, name: &str) -> String {
    let user = auth
        .options()
        .adapter()
        .create_user(NewUser {
            name: Some(name.to_string()),
            ..NewUser::default()
        })
        .await
        .unwrap();
    let set_cookie = auth.create_session(&user.id).await.unwrap();
    cookie_pair(&set_cookie).to_string()
}

/// `name=value` part of a `Set-Cookie` value
pub fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or_default()
}
