//! Session values exposed to the page and `/api/auth/session`

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::adapter::{AdapterSession, AdapterUser};

/// Identity claims of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Avatar URL
    pub image: Option<String>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Who is signed in
    pub user: SessionUser,
    /// When the session ends
    pub expires: DateTime<Utc>,
}

impl Session {
    /// Build the public view of a stored session
    #[must_use]
    pub fn from_parts(session: &AdapterSession, user: &AdapterUser) -> Self {
        Self {
            user: SessionUser {
                name: user.name.clone(),
                email: user.email.clone(),
                image: user.image.clone(),
            },
            expires: session.expires,
        }
    }

    /// Name to greet the user with
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user
            .name
            .as_deref()
            .or(self.user.email.as_deref())
            .unwrap_or("signed-in user")
    }
}

/// Session lifetime settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Lifetime of a new session
    pub max_age: Duration,
    /// Extend the expiry at most this often on use
    pub update_age: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_age: Duration::days(30),
            update_age: Duration::days(1),
        }
    }
}

impl SessionOptions {
    /// Max age in whole seconds, for the cookie
    #[must_use]
    pub fn max_age_secs(&self) -> u64 {
        u64::try_from(self.max_age.num_seconds()).unwrap_or(0)
    }

    /// Whether a session expiring at `expires` should be extended now
    ///
    /// True once more than `update_age` has passed since it was last extended.
    #[must_use]
    pub fn needs_refresh(&self, expires: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        expires - self.max_age + self.update_age < now
    }
}

/// Generate an opaque session token
#[must_use]
pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>, email: Option<&str>) -> AdapterUser {
        AdapterUser {
            id: "u1".into(),
            name: name.map(Into::into),
            email: email.map(Into::into),
            email_verified: None,
            image: None,
        }
    }

    #[test]
    fn test_session_json_shape() {
        let expires = "2030-01-01T00:00:00Z".parse().unwrap();
        let session = Session::from_parts(
            &AdapterSession {
                session_token: "t".into(),
                user_id: "u1".into(),
                expires,
            },
            &user(Some("Jane"), Some("jane@example.com")),
        );

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["user"]["name"], "Jane");
        assert_eq!(json["user"]["email"], "jane@example.com");
        assert_eq!(json["expires"], "2030-01-01T00:00:00Z");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let session = Session::from_parts(
            &AdapterSession {
                session_token: "t".into(),
                user_id: "u1".into(),
                expires: Utc::now(),
            },
            &user(None, Some("jane@example.com")),
        );
        assert_eq!(session.display_name(), "jane@example.com");
    }

    #[test]
    fn test_needs_refresh() {
        let options = SessionOptions::default();
        let now = Utc::now();

        assert!(!options.needs_refresh(now + options.max_age, now));
        assert!(options.needs_refresh(now + options.max_age - Duration::days(2), now));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(new_session_token(), new_session_token());
    }
}
