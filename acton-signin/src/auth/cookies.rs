//! Cookie names, parsing and `Set-Cookie` formatting

use axum::http::{header::COOKIE, HeaderMap};

use crate::config::SameSitePolicy;

/// Session token cookie
pub const SESSION_COOKIE: &str = "acton_signin.session_token";
/// Anti-forgery double-submit cookie
pub const CSRF_COOKIE: &str = "acton_signin.csrf_token";
/// Prefix of the cookies binding OAuth `state` values to the browser
pub const STATE_COOKIE: &str = "acton_signin.state";

/// Cookie name for one pending OAuth flow
///
/// Each flow gets its own cookie so sign-ins started in parallel tabs do not
/// overwrite each other.
#[must_use]
pub fn state_cookie_name(state: &str) -> String {
    format!("{STATE_COOKIE}.{state}")
}

/// Whether `state` can be embedded in a cookie name
///
/// Generated states are URL-safe base64; anything else came from elsewhere.
#[must_use]
pub fn is_state_token(state: &str) -> bool {
    !state.is_empty()
        && state.len() <= 128
        && state
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Attributes shared by every cookie the handler sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    /// Add the `Secure` attribute
    pub secure: bool,
    /// SameSite policy
    pub same_site: SameSitePolicy,
    /// Cookie path
    pub path: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: !cfg!(debug_assertions),
            same_site: SameSitePolicy::Lax,
            path: "/".to_string(),
        }
    }
}

impl CookieSettings {
    /// Format an HttpOnly `Set-Cookie` value
    ///
    /// `max_age_secs` of `None` makes a browser-session cookie.
    #[must_use]
    pub fn build(&self, name: &str, value: &str, max_age_secs: Option<u64>) -> String {
        let mut cookie = format!(
            "{name}={value}; Path={}; SameSite={}; HttpOnly",
            self.path,
            self.same_site.as_str()
        );

        if let Some(max_age) = max_age_secs {
            cookie.push_str(&format!("; Max-Age={max_age}"));
        }

        if self.secure {
            cookie.push_str("; Secure");
        }

        cookie
    }

    /// Format a `Set-Cookie` value that deletes `name`
    #[must_use]
    pub fn expire(&self, name: &str) -> String {
        self.build(name, "", Some(0))
    }
}

/// Read a cookie from the request headers
///
/// All `Cookie` headers are searched; the first match wins.
#[must_use]
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
