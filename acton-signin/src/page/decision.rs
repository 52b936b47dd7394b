//! Redirect-or-render decision for the sign-in page
//!
//! The same pure function runs on the server before rendering and again
//! when the browser re-checks `/api/auth/session` after load.

use crate::auth::Session;

/// Where authenticated visitors are sent
pub const HOME_ROUTE: &str = "/";

/// Authentication status as seen by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Not yet known
    Loading,
    /// A valid session exists
    Authenticated,
    /// No session
    Unauthenticated,
}

impl From<Option<&Session>> for SessionStatus {
    fn from(session: Option<&Session>) -> Self {
        if session.is_some() {
            Self::Authenticated
        } else {
            Self::Unauthenticated
        }
    }
}

/// Outcome of [`decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    /// Leave the page for this route
    Redirect(&'static str),
    /// Show the provider buttons
    Render,
}

/// Decide whether the sign-in page renders
///
/// Only an authenticated status redirects; while the status is loading the
/// page keeps whatever it already shows.
#[must_use]
pub const fn decide(status: SessionStatus) -> PageDecision {
    match status {
        SessionStatus::Authenticated => PageDecision::Redirect(HOME_ROUTE),
        SessionStatus::Loading | SessionStatus::Unauthenticated => PageDecision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionUser;
    use chrono::Utc;

    #[test]
    fn test_authenticated_redirects_home() {
        assert_eq!(decide(SessionStatus::Authenticated), PageDecision::Redirect("/"));
    }

    #[test]
    fn test_unauthenticated_renders() {
        assert_eq!(decide(SessionStatus::Unauthenticated), PageDecision::Render);
        assert_eq!(decide(SessionStatus::Loading), PageDecision::Render);
    }

    #[test]
    fn test_status_from_session() {
        let session = Session {
            user: SessionUser {
                name: None,
                email: Some("a@example.com".into()),
                image: None,
            },
            expires: Utc::now(),
        };
        assert_eq!(SessionStatus::from(Some(&session)), SessionStatus::Authenticated);
        assert_eq!(SessionStatus::from(None), SessionStatus::Unauthenticated);
    }
}
