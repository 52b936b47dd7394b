//! Resolving a provider identity to a local user

use chrono::Utc;

use super::adapter::{Adapter, AdapterAccount, AdapterUser, NewUser};
use super::credentials::VerifiedUser;
use crate::error::AuthError;
use crate::oauth2::{OAuthToken, OAuthUserInfo};

/// Identity returned by a provider, independent of the provider kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInProfile {
    /// Provider id
    pub provider: String,
    /// Account id at the provider
    pub provider_account_id: String,
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Avatar URL
    pub image: Option<String>,
    /// Whether the provider verified the email
    pub email_verified: bool,
}

impl SignInProfile {
    /// Profile from an OAuth userinfo response
    #[must_use]
    pub fn from_oauth(provider: &str, info: OAuthUserInfo) -> Self {
        Self {
            provider: provider.to_string(),
            provider_account_id: info.provider_user_id,
            name: info.name,
            email: info.email,
            image: info.avatar_url,
            email_verified: info.email_verified,
        }
    }

    /// Profile from a credentials verifier
    #[must_use]
    pub fn from_credentials(provider: &str, user: VerifiedUser) -> Self {
        Self {
            provider: provider.to_string(),
            provider_account_id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
            email_verified: false,
        }
    }

    fn account(&self, user_id: &str, token: Option<&OAuthToken>) -> AdapterAccount {
        AdapterAccount {
            user_id: user_id.to_string(),
            provider: self.provider.clone(),
            provider_account_id: self.provider_account_id.clone(),
            access_token: token.map(|t| t.access_token.clone()),
            refresh_token: token.and_then(|t| t.refresh_token.clone()),
            expires_at: token.and_then(|t| t.expires_at),
            scope: token.and_then(|t| t.scope.clone()),
        }
    }
}

/// Find or create the user a sign-in belongs to
///
/// 1. A linked account signs its user in, refreshing stored tokens and
///    profile fields.
/// 2. Otherwise, a signed-in user (`current_user_id`) gets the account linked.
/// 3. Otherwise, an email already owned by another user is refused with
///    [`AuthError::AccountNotLinked`].
/// 4. Otherwise a new user is created and the account linked to it.
///
/// # Errors
///
/// Returns [`AuthError::AccountNotLinked`] per the rules above, or adapter
/// failures.
pub async fn resolve_user(
    adapter: &dyn Adapter,
    profile: &SignInProfile,
    token: Option<&OAuthToken>,
    current_user_id: Option<&str>,
) -> Result<AdapterUser, AuthError> {
    if let Some(user) = adapter
        .get_user_by_account(&profile.provider, &profile.provider_account_id)
        .await?
    {
        if current_user_id.is_some_and(|current| current != user.id) {
            return Err(AuthError::AccountNotLinked);
        }
        adapter.link_account(profile.account(&user.id, token)).await?;
        return refresh_profile(adapter, user, profile).await;
    }

    if let Some(current) = current_user_id {
        if let Some(user) = adapter.get_user(current).await? {
            adapter.link_account(profile.account(&user.id, token)).await?;
            tracing::info!(provider = %profile.provider, user_id = %user.id, "Account linked to signed-in user");
            return Ok(user);
        }
    }

    if let Some(email) = &profile.email {
        if adapter.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::AccountNotLinked);
        }
    }

    let user = adapter
        .create_user(NewUser {
            name: profile.name.clone(),
            email: profile.email.clone(),
            email_verified: profile.email_verified.then(Utc::now),
            image: profile.image.clone(),
        })
        .await?;
    adapter.link_account(profile.account(&user.id, token)).await?;
    tracing::info!(provider = %profile.provider, user_id = %user.id, "User created");

    Ok(user)
}

async fn refresh_profile(
    adapter: &dyn Adapter,
    user: AdapterUser,
    profile: &SignInProfile,
) -> Result<AdapterUser, AuthError> {
    let updated = AdapterUser {
        name: profile.name.clone().or_else(|| user.name.clone()),
        image: profile.image.clone().or_else(|| user.image.clone()),
        ..user.clone()
    };

    if updated == user {
        return Ok(user);
    }
    Ok(adapter.update_user(updated).await?)
}
