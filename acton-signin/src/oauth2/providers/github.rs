//! GitHub OAuth2 provider

use serde::Deserialize;

use super::base::BaseOAuthProvider;
use crate::oauth2::types::{
    ClientCredentials, OAuthError, OAuthProvider, OAuthUserInfo, ProfileStyle,
};

/// Authorization endpoint
pub const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
/// Token endpoint
pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
/// Profile endpoint
pub const USERINFO_URL: &str = "https://api.github.com/user";
/// Email list endpoint, used when the profile email is private
pub const EMAILS_URL: &str = "https://api.github.com/user/emails";

/// Environment variable holding the client id
pub const CLIENT_ID_ENV: &str = "GITHUB_ID";
/// Environment variable holding the client secret
pub const CLIENT_SECRET_ENV: &str = "GITHUB_SECRET";

/// Build the GitHub provider
#[must_use]
pub fn provider(credentials: ClientCredentials) -> OAuthProvider {
    OAuthProvider {
        id: "github".to_string(),
        name: "GitHub".to_string(),
        credentials,
        auth_url: AUTH_URL.to_string(),
        token_url: TOKEN_URL.to_string(),
        userinfo_url: USERINFO_URL.to_string(),
        scopes: vec!["read:user".to_string(), "user:email".to_string()],
        profile: ProfileStyle::GitHub,
    }
}

/// Fetch and normalise the GitHub profile
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
    let user: GitHubUser = serde_json::from_value(base.fetch_json(userinfo_url, access_token).await?)
        .map_err(|e| OAuthError::UserInfoFailed(format!("Failed to parse user JSON: {e}")))?;

    let emails = if user.email.is_some() {
        Vec::new()
    } else {
        // the emails scope may have been declined; a profile without email is still usable
        match base.fetch_json(EMAILS_URL, access_token).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(e) => {
                tracing::debug!(error = %e, "GitHub email list unavailable");
                Vec::new()
            }
        }
    };

    Ok(normalize(user, &emails))
}

fn normalize(user: GitHubUser, emails: &[GitHubEmail]) -> OAuthUserInfo {
    let listed = emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified));

    let (email, email_verified) = match (user.email, listed) {
        (Some(public), _) => (Some(public), false),
        (None, Some(listed)) => (Some(listed.email.clone()), listed.verified),
        (None, None) => (None, false),
    };

    OAuthUserInfo {
        provider_user_id: user.id.to_string(),
        email,
        name: user.name.or(Some(user.login)),
        avatar_url: user.avatar_url,
        email_verified,
    }
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    verified: bool,
    primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(email: Option<&str>) -> GitHubUser {
        serde_json::from_value(json!({
            "id": 583231,
            "login": "octocat",
            "name": null,
            "email": email,
            "avatar_url": "https://avatars.githubusercontent.com/u/583231"
        }))
        .unwrap()
    }

    #[test]
    fn test_authorization_url() {
        let provider = provider(ClientCredentials::new("gh-client", "gh-secret"));
        let base =
            BaseOAuthProvider::new(&provider, "http://localhost:3000/api/auth/callback/github")
                .unwrap();
        let request = base.authorization_url();

        assert!(request.url.starts_with(AUTH_URL));
        assert!(request.url.contains("client_id=gh-client"));
        assert!(request.url.contains("scope=read%3Auser+user%3Aemail"));
    }

    #[test]
    fn test_public_email_wins() {
        let info = normalize(user(Some("octo@example.com")), &[]);
        assert_eq!(info.provider_user_id, "583231");
        assert_eq!(info.email.as_deref(), Some("octo@example.com"));
        assert_eq!(info.name.as_deref(), Some("octocat"));
    }

    #[test]
    fn test_private_email_uses_primary_verified() {
        let emails: Vec<GitHubEmail> = serde_json::from_value(json!([
            { "email": "old@example.com", "verified": true, "primary": false },
            { "email": "main@example.com", "verified": true, "primary": true }
        ]))
        .unwrap();

        let info = normalize(user(None), &emails);
        assert_eq!(info.email.as_deref(), Some("main@example.com"));
        assert!(info.email_verified);
    }

    #[test]
    fn test_unverified_emails_are_ignored() {
        let emails: Vec<GitHubEmail> = serde_json::from_value(json!([
            { "email": "typo@example.com", "verified": false, "primary": true }
        ]))
        .unwrap();

        let info = normalize(user(None), &emails);
        assert!(info.email.is_none());
        assert!(!info.email_verified);
    }
}
