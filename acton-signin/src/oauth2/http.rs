//! HTTP client used by the oauth2 crate for token exchange

use thiserror::Error;

/// Failure while performing an OAuth2 HTTP request
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// Transport failure
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// Response could not be rebuilt
    #[error(transparent)]
    Http(#[from] http::Error),
}

/// Async HTTP client for OAuth2 requests
///
/// Redirects are disabled, as token endpoints must answer directly.
///
/// # Errors
///
/// Returns an error if the request cannot be sent or the body cannot be read.
pub async fn async_http_client(
    request: oauth2::HttpRequest,
) -> Result<oauth2::HttpResponse, HttpClientError> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let method = request.method().clone();
    let url = request.uri().to_string();
    let headers = request.headers().clone();
    let body = request.into_body();

    let mut request_builder = client.request(method, &url).body(body);
    for (name, value) in &headers {
        request_builder = request_builder.header(name.as_str(), value.as_bytes());
    }

    let response = request_builder.send().await?;

    let status_code = response.status();
    let headers = response.headers().to_owned();
    let body = response.bytes().await?.to_vec();

    let mut builder = http::Response::builder().status(status_code);
    for (name, value) in &headers {
        builder = builder.header(name, value);
    }

    Ok(builder.body(body)?)
}
