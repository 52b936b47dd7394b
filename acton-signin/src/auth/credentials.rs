//! Credentials (username/password style) sign-in
//!
//! A credentials provider renders a small form on the sign-in page and posts
//! it to `/api/auth/callback/{id}`. The submitted fields are handed to a
//! [`CredentialsVerifier`]; the provider is never enabled without one.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::LocalUserSettings;

/// Credentials verification errors
///
/// Wrong credentials are not an error; verifiers return `Ok(None)` for them.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// Password hashing failed
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The verifier's backing store failed
    #[error("verifier backend failed: {0}")]
    Backend(String),
}

/// A user accepted by a [`CredentialsVerifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    /// Stable id of the user within this provider
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Avatar URL
    pub image: Option<String>,
}

/// Checks submitted form fields
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialsVerifier: Send + Sync {
    /// Return the user these fields identify, or `None` to reject them
    async fn verify(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<Option<VerifiedUser>, CredentialsError>;
}

/// One input of the credentials form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialField {
    /// Form field name
    pub name: String,
    /// Visible label
    pub label: String,
    /// HTML input type
    #[serde(rename = "type")]
    pub input_type: String,
    /// Placeholder text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl CredentialField {
    /// A text input
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            input_type: "text".to_string(),
            placeholder: None,
        }
    }

    /// A password input
    pub fn password(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            input_type: "password".to_string(),
            ..Self::text(name, label)
        }
    }

    /// Set the placeholder
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// A configured credentials provider
#[derive(Clone)]
pub struct CredentialsProvider {
    /// Provider id
    pub id: String,
    /// Display name
    pub name: String,
    /// Inputs shown on the sign-in page
    pub fields: Vec<CredentialField>,
    verifier: Arc<dyn CredentialsVerifier>,
}

impl CredentialsProvider {
    /// Provider `credentials` with username and password fields
    pub fn new(verifier: Arc<dyn CredentialsVerifier>) -> Self {
        Self {
            id: "credentials".to_string(),
            name: "Credentials".to_string(),
            fields: vec![
                CredentialField::text("username", "Username").with_placeholder("jsmith"),
                CredentialField::password("password", "Password"),
            ],
            verifier,
        }
    }

    /// Replace the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the form fields
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<CredentialField>) -> Self {
        self.fields = fields;
        self
    }

    /// Run the verifier
    ///
    /// # Errors
    ///
    /// Propagates verifier failures.
    pub async fn verify(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<Option<VerifiedUser>, CredentialsError> {
        self.verifier.verify(fields).await
    }
}

impl fmt::Debug for CredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsProvider")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct LocalUser {
    password_hash: String,
    name: Option<String>,
    email: Option<String>,
}

/// In-memory username/password verifier using Argon2id hashes
///
/// Reads the `username` and `password` fields.
pub struct LocalUserVerifier {
    users: RwLock<HashMap<String, LocalUser>>,
    // compared against when the username is unknown, so both paths hash once
    dummy_hash: String,
}

impl LocalUserVerifier {
    /// Create an empty verifier
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Hash`] if Argon2 cannot hash.
    pub fn new() -> Result<Self, CredentialsError> {
        let dummy_salt = SaltString::generate(&mut OsRng);
        Ok(Self {
            users: RwLock::new(HashMap::new()),
            dummy_hash: hash(&dummy_salt, "acton-signin-dummy")?,
        })
    }

    /// Add or replace a user
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Hash`] if the password cannot be hashed.
    pub fn add_user(
        &self,
        username: impl Into<String>,
        password: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<(), CredentialsError> {
        let salt = SaltString::generate(&mut OsRng);
        let user = LocalUser {
            password_hash: hash(&salt, password)?,
            name,
            email,
        };
        self.users.write().insert(username.into(), user);
        Ok(())
    }

    /// Add or replace a user whose password is already hashed
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Hash`] if `password_hash` is not a PHC
    /// string.
    pub fn add_hashed_user(
        &self,
        username: impl Into<String>,
        password_hash: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<(), CredentialsError> {
        let username = username.into();
        PasswordHash::new(password_hash)
            .map_err(|e| CredentialsError::Hash(format!("user {username}: {e}")))?;
        let user = LocalUser {
            password_hash: password_hash.to_string(),
            name,
            email,
        };
        self.users.write().insert(username, user);
        Ok(())
    }

    /// Build a verifier from `[[auth.users]]` entries
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Hash`] for the first malformed hash.
    pub fn from_settings(users: &[LocalUserSettings]) -> Result<Self, CredentialsError> {
        let verifier = Self::new()?;
        for user in users {
            verifier.add_hashed_user(
                user.username.clone(),
                &user.password_hash,
                user.name.clone(),
                user.email.clone(),
            )?;
        }
        Ok(verifier)
    }

    /// Number of known users
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether no users are known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a user, returning whether it existed
    pub fn remove_user(&self, username: &str) -> bool {
        self.users.write().remove(username).is_some()
    }
}

/// Hash a password with Argon2id and a random salt, in PHC string format
///
/// # Errors
///
/// Returns [`CredentialsError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CredentialsError> {
    hash(&SaltString::generate(&mut OsRng), password)
}

fn hash(salt: &SaltString, password: &str) -> Result<String, CredentialsError> {
    Argon2::default()
        .hash_password(password.as_bytes(), salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialsError::Hash(e.to_string()))
}

#[async_trait]
impl CredentialsVerifier for LocalUserVerifier {
    async fn verify(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<Option<VerifiedUser>, CredentialsError> {
        let (Some(username), Some(password)) = (fields.get("username"), fields.get("password"))
        else {
            return Ok(None);
        };

        let user = self.users.read().get(username).cloned();
        let stored = user
            .as_ref()
            .map_or(self.dummy_hash.as_str(), |u| u.password_hash.as_str());

        let parsed = PasswordHash::new(stored).map_err(|e| CredentialsError::Hash(e.to_string()))?;
        let valid = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();

        Ok(user.filter(|_| valid).map(|user| VerifiedUser {
            id: username.clone(),
            name: user.name.or_else(|| Some(username.clone())),
            email: user.email,
            image: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(username: &str, password: &str) -> HashMap<String, String> {
        HashMap::from([
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ])
    }

    fn verifier() -> LocalUserVerifier {
        let verifier = LocalUserVerifier::new().unwrap();
        verifier
            .add_user(
                "jsmith",
                "correct horse",
                Some("J Smith".into()),
                Some("jsmith@example.com".into()),
            )
            .unwrap();
        verifier
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let user = verifier()
            .verify(&fields("jsmith", "correct horse"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, "jsmith");
        assert_eq!(user.email.as_deref(), Some("jsmith@example.com"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let result = verifier().verify(&fields("jsmith", "battery staple")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        let result = verifier().verify(&fields("nobody", "correct horse")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let result = verifier().verify(&HashMap::new()).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_removed_user_is_rejected() {
        let verifier = verifier();
        assert!(verifier.remove_user("jsmith"));
        let result = verifier.verify(&fields("jsmith", "correct horse")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_users_from_settings() {
        let users = [LocalUserSettings {
            username: "admin".into(),
            password_hash: hash_password("hunter22").unwrap(),
            name: None,
            email: Some("admin@example.com".into()),
        }];
        let verifier = LocalUserVerifier::from_settings(&users).unwrap();
        assert_eq!(verifier.len(), 1);

        let user = verifier
            .verify(&fields("admin", "hunter22"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.name.as_deref(), Some("admin"));
        assert!(verifier.verify(&fields("admin", "hunter2")).await.unwrap().is_none());
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        let users = [LocalUserSettings {
            username: "admin".into(),
            password_hash: "plaintext".into(),
            name: None,
            email: None,
        }];
        let err = LocalUserVerifier::from_settings(&users).err().unwrap();
        assert!(matches!(err, CredentialsError::Hash(ref msg) if msg.contains("admin")));
    }

    #[test]
    fn test_default_fields() {
        let provider = CredentialsProvider::new(Arc::new(MockCredentialsVerifier::new()));
        assert_eq!(provider.id, "credentials");
        let names: Vec<_> = provider.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["username", "password"]);
        assert_eq!(provider.fields[1].input_type, "password");
    }
}
