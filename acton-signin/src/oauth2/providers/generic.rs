//! Userinfo normalisation for providers declared in `[[auth.custom]]`

use serde_json::Value;

use super::base::BaseOAuthProvider;
use crate::oauth2::types::{OAuthError, OAuthUserInfo};

/// Fetch and normalise a generic userinfo document
///
/// # Errors
///
/// Returns [`OAuthError::UserInfoFailed`] if the document cannot be fetched
/// or has no usable account id.
pub async fn fetch_user_info(
    base: &BaseOAuthProvider,
    userinfo_url: &str,
    access_token: &str,
) -> Result<OAuthUserInfo, OAuthError> {
    let profile = base.fetch_json(userinfo_url, access_token).await?;
    normalize(&profile)
}

fn normalize(profile: &Value) -> Result<OAuthUserInfo, OAuthError> {
    let provider_user_id = ["sub", "id"]
        .iter()
        .find_map(|key| match profile.get(*key)? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
        .ok_or_else(|| OAuthError::UserInfoFailed("profile has no 'sub' or 'id'".into()))?;

    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| profile.get(*key)?.as_str().map(str::to_string))
    };

    Ok(OAuthUserInfo {
        provider_user_id,
        email: text(&["email"]),
        name: text(&["name", "preferred_username", "login", "username"]),
        avatar_url: text(&["picture", "avatar_url"]),
        email_verified: profile
            .get("email_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}
