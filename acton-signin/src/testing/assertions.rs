//! Response assertions shared by handler tests

use axum::http::{header, StatusCode};
use axum_test::TestResponse;

/// Assert a `303 See Other` to `expected`
///
/// # Panics
///
/// Panics if the status or `Location` differ.
pub fn assert_redirect(response: &TestResponse, expected: &str) {
    response.assert_status(StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("Location header not found");
    let actual = location.to_str().expect("Invalid Location header value");
    assert_eq!(actual, expected, "Expected redirect to {expected}, got {actual}");
}

/// The `Set-Cookie` value for `name`, if the response sets it
pub fn set_cookie(response: &TestResponse, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}
