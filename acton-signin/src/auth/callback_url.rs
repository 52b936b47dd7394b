//! Post sign-in redirect targets
//!
//! Only relative paths and absolute URLs on the application's own origin are
//! followed; anything else falls back to the home page. Relative paths are
//! joined onto the origin and re-serialized, so the result is always a valid
//! `Location` header value.

use reqwest::Url;

/// Where the browser goes when no valid callback URL was supplied
pub const DEFAULT_CALLBACK_URL: &str = "/";

/// Resolve a requested callback URL against the application origin
#[must_use]
pub fn resolve_callback_url(candidate: Option<&str>, base_url: &str) -> String {
    let Some(candidate) = candidate.map(str::trim).filter(|c| !c.is_empty()) else {
        return DEFAULT_CALLBACK_URL.to_string();
    };
    // browsers drop tabs and newlines inside URLs and read "\" as "/"
    if candidate
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || c == '\\')
    {
        return DEFAULT_CALLBACK_URL.to_string();
    }
    let Ok(base) = Url::parse(base_url) else {
        return DEFAULT_CALLBACK_URL.to_string();
    };

    if candidate.starts_with('/') {
        // "//host" is protocol-relative
        if candidate.starts_with("//") {
            return DEFAULT_CALLBACK_URL.to_string();
        }
        return match base.join(candidate) {
            Ok(url) if url.origin() == base.origin() => path_and_query(&url),
            _ => DEFAULT_CALLBACK_URL.to_string(),
        };
    }

    match Url::parse(candidate) {
        Ok(url) if url.origin() == base.origin() => url.to_string(),
        _ => DEFAULT_CALLBACK_URL.to_string(),
    }
}

fn path_and_query(url: &Url) -> String {
    let mut relative = url.path().to_string();
    if let Some(query) = url.query() {
        relative.push('?');
        relative.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        relative.push('#');
        relative.push_str(fragment);
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const BASE: &str = "https://app.example.com";

    #[test]
    fn test_relative_paths_are_kept() {
        assert_eq!(resolve_callback_url(Some("/dashboard?tab=1"), BASE), "/dashboard?tab=1");
        assert_eq!(resolve_callback_url(Some("/docs#intro"), BASE), "/docs#intro");
    }

    #[test]
    fn test_missing_or_blank_is_home() {
        assert_eq!(resolve_callback_url(None, BASE), "/");
        assert_eq!(resolve_callback_url(Some("  "), BASE), "/");
    }

    #[test]
    fn test_same_origin_absolute_url_is_kept() {
        assert_eq!(
            resolve_callback_url(Some("https://app.example.com/settings"), BASE),
            "https://app.example.com/settings"
        );
    }

    #[test]
    fn test_foreign_origins_are_rejected() {
        assert_eq!(resolve_callback_url(Some("https://evil.example.com/"), BASE), "/");
        assert_eq!(resolve_callback_url(Some("http://app.example.com/"), BASE), "/");
        assert_eq!(resolve_callback_url(Some("//evil.example.com"), BASE), "/");
        assert_eq!(resolve_callback_url(Some("/\\evil.example.com"), BASE), "/");
        assert_eq!(resolve_callback_url(Some("javascript:alert(1)"), BASE), "/");
    }

    #[test]
    fn test_embedded_tabs_and_newlines_are_rejected() {
        for candidate in [
            "/\t/evil.example.com",
            "/\n/evil.example.com",
            "/\r/evil.example.com",
            "/a\nb",
            "/a b",
            "https://app.example.com/\t/x",
        ] {
            assert_eq!(resolve_callback_url(Some(candidate), BASE), "/", "{candidate:?}");
        }
    }

    #[test]
    fn test_percent_encoded_whitespace_stays_on_origin() {
        // encoded bytes are not decoded by the browser before navigation
        let resolved = resolve_callback_url(Some("/%09/evil.example.com"), BASE);
        assert_eq!(resolved, "/%09/evil.example.com");
        assert!(!resolved.starts_with("//"));
    }

    #[test]
    fn test_result_is_always_a_header_value() {
        for candidate in ["/caf\u{e9}", "/a?q=\u{1f600}", "/a\u{7f}b", "/\u{0}"] {
            let resolved = resolve_callback_url(Some(candidate), BASE);
            assert!(HeaderValue::from_str(&resolved).is_ok(), "{resolved:?}");
            assert!(resolved.starts_with('/') && !resolved.starts_with("//"));
        }
    }
}
