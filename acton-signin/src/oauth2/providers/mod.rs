//! OAuth2 provider implementations
//!
//! GitHub and Google are built in; any other OAuth 2.0 provider can be
//! declared in configuration and uses the generic profile mapping. All of them
//! share `BaseOAuthProvider` for the handshake itself.

pub mod base;
pub mod generic;
pub mod github;
pub mod google;

pub use base::{AuthorizationRequest, BaseOAuthProvider};

use crate::oauth2::types::{OAuthError, OAuthProvider, OAuthUserInfo, ProfileStyle};

/// Fetch the profile of the signed-in account, normalised per provider
///
/// # Errors
///
/// Returns [`OAuthError::UserInfoFailed`] if the provider API call fails.
pub async fn fetch_user_info(
    provider: &OAuthProvider,
    base: &BaseOAuthProvider,
    access_token: &str,
) -> Result<OAuthUserInfo, OAuthError> {
    match provider.profile {
        ProfileStyle::GitHub => {
            github::fetch_user_info(base, &provider.userinfo_url, access_token).await
        }
        ProfileStyle::Google => {
            google::fetch_user_info(base, &provider.userinfo_url, access_token).await
        }
        ProfileStyle::Generic => {
            generic::fetch_user_info(base, &provider.userinfo_url, access_token).await
        }
    }
}
