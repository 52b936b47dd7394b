//! Google OAuth2 provider (OpenID Connect userinfo)

use serde::Deserialize;

use super::base::BaseOAuthProvider;
use crate::oauth2::types::{
    ClientCredentials, OAuthError, OAuthProvider, OAuthUserInfo, ProfileStyle,
};

/// Authorization endpoint
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Userinfo endpoint
pub const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Environment variable holding the client id
pub const CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
/// Environment variable holding the client secret
pub const CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";

/// Build the Google provider
#[must_use]
pub fn provider(credentials: ClientCredentials) -> OAuthProvider {
    OAuthProvider {
        id: "google".to_string(),
        name: "Google".to_string(),
        credentials,
        auth_url: AUTH_URL.to_string(),
        token_url: TOKEN_URL.to_string(),
        userinfo_url: USERINFO_URL.to_string(),
        scopes: vec![
            "openid".to_string(),
            "email".to_string(),
            "profile".to_string(),
        ],
        profile: ProfileStyle::Google,
    }
}

/// Fetch and normalise the Google profile
///
/// # Errors
///
/// Returns [`OAuthError::UserInfoFailed`] if the profile cannot be fetched
/// or parsed.
pub async fn fetch_user_info(
    base: &BaseOAuthProvider,
    userinfo_url: &str,
    access_token: &str,
) -> Result<OAuthUserInfo, OAuthError> {
    let user: GoogleUser = serde_json::from_value(base.fetch_json(userinfo_url, access_token).await?)
        .map_err(|e| OAuthError::UserInfoFailed(format!("Failed to parse user JSON: {e}")))?;

    Ok(user.into())
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

impl From<GoogleUser> for OAuthUserInfo {
    fn from(user: GoogleUser) -> Self {
        Self {
            provider_user_id: user.sub,
            email: user.email,
            name: user.name,
            avatar_url: user.picture,
            email_verified: user.email_verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_authorization_url() {
        let provider = provider(ClientCredentials::new("google-client", "google-secret"));
        let base =
            BaseOAuthProvider::new(&provider, "http://localhost:3000/api/auth/callback/google")
                .unwrap();
        let request = base.authorization_url();

        assert!(request.url.starts_with(AUTH_URL));
        assert!(request.url.contains("client_id=google-client"));
        assert!(request.url.contains("scope=openid+email+profile"));
        assert!(request
            .url
            .contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback%2Fgoogle"));
    }

    #[test]
    fn test_userinfo_mapping() {
        let user: GoogleUser = serde_json::from_value(json!({
            "sub": "110169484474386276334",
            "email": "jane@example.com",
            "email_verified": true,
            "name": "Jane Doe",
            "picture": "https://lh3.googleusercontent.com/a/photo.jpg"
        }))
        .unwrap();

        let info = OAuthUserInfo::from(user);
        assert_eq!(info.provider_user_id, "110169484474386276334");
        assert_eq!(info.email.as_deref(), Some("jane@example.com"));
        assert!(info.email_verified);
        assert_eq!(info.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_email_verified_defaults_to_false() {
        let user: GoogleUser = serde_json::from_value(json!({ "sub": "1" })).unwrap();
        assert!(!OAuthUserInfo::from(user).email_verified);
    }
}
