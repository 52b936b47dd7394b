//! Anti-forgery tokens (double-submit cookie)
//!
//! The cookie holds `token|hex(sha256(token || secret))`. A form submission is
//! accepted when its `csrfToken` equals the token of a cookie whose hash
//! verifies against the server secret.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Form field carrying the token
pub const CSRF_FORM_FIELD: &str = "csrfToken";

/// CSRF token string (base64url-encoded 32-byte random value)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generate a new random token
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A token plus the cookie to set, if the browser needs a new one
#[derive(Debug, Clone)]
pub struct CsrfIssue {
    /// Token to embed in forms
    pub token: CsrfToken,
    /// New cookie value; `None` when the existing cookie is still valid
    pub cookie_value: Option<String>,
}

fn hash(token: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Format the cookie value for `token`
#[must_use]
pub fn cookie_value(token: &CsrfToken, secret: &str) -> String {
    format!("{}|{}", token.as_str(), hash(token.as_str(), secret))
}

/// Extract the token from a cookie value whose hash verifies
#[must_use]
pub fn verify_cookie(value: &str, secret: &str) -> Option<CsrfToken> {
    let (token, digest) = value.split_once('|')?;
    if token.is_empty() {
        return None;
    }
    constant_time_eq(digest.as_bytes(), hash(token, secret).as_bytes())
        .then(|| CsrfToken(token.to_string()))
}

/// Reuse the browser's token if its cookie verifies, otherwise mint one
#[must_use]
pub fn issue(existing_cookie: Option<&str>, secret: &str) -> CsrfIssue {
    if let Some(token) = existing_cookie.and_then(|value| verify_cookie(value, secret)) {
        return CsrfIssue {
            token,
            cookie_value: None,
        };
    }

    let token = CsrfToken::generate();
    CsrfIssue {
        cookie_value: Some(cookie_value(&token, secret)),
        token,
    }
}

/// Check a submitted token against the cookie
#[must_use]
pub fn verify_submission(cookie: Option<&str>, submitted: Option<&str>, secret: &str) -> bool {
    match (cookie.and_then(|value| verify_cookie(value, secret)), submitted) {
        (Some(expected), Some(submitted)) => {
            constant_time_eq(expected.as_str().as_bytes(), submitted.as_bytes())
        }
        _ => false,
    }
}
