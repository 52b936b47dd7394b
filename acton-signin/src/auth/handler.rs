//! `/api/auth/*` route handlers
//!
//! | Route                          | Method | Purpose                              |
//! |--------------------------------|--------|--------------------------------------|
//! | `/api/auth/providers`          | GET    | Enabled providers                    |
//! | `/api/auth/csrf`               | GET    | Anti-forgery token                   |
//! | `/api/auth/session`            | GET    | Current session or `{}`              |
//! | `/api/auth/signin/{provider}`  | POST   | Begin sign-in                        |
//! | `/api/auth/callback/{provider}`| GET    | OAuth callback                       |
//! | `/api/auth/callback/{provider}`| POST   | Credentials submission               |
//! | `/api/auth/signout`            | POST   | Delete the session                   |

use axum::{
    extract::{FromRef, Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;

use super::account::{resolve_user, SignInProfile};
use super::callback_url::resolve_callback_url;
use super::cookies::{is_state_token, read_cookie, state_cookie_name, SESSION_COOKIE};
use super::csrf::CSRF_FORM_FIELD;
use super::handle::AuthHandle;
use super::providers::{Provider, ProviderDescriptor};
use crate::error::AuthError;
use crate::oauth2::{providers::fetch_user_info, BaseOAuthProvider, OAuthError, OAuthProvider, FLOW_TTL};

/// Form posted by a provider button
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    /// Anti-forgery token
    #[serde(rename = "csrfToken")]
    pub csrf_token: Option<String>,
    /// Where to land after sign-in
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Query string of an OAuth callback
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    /// Authorization code
    pub code: Option<String>,
    /// State parameter
    pub state: Option<String>,
    /// Error code when the user or provider refused
    pub error: Option<String>,
}

/// Routes served under `/api/auth`
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    AuthHandle: FromRef<S>,
{
    Router::new()
        .route("/providers", get(providers))
        .route("/csrf", get(csrf))
        .route("/session", get(session))
        .route("/signin/{provider}", get(signin_page).post(begin_signin))
        .route(
            "/callback/{provider}",
            get(oauth_callback).post(credentials_callback),
        )
        .route("/signout", post(signout))
}

async fn providers(
    State(auth): State<AuthHandle>,
) -> Result<Json<Vec<ProviderDescriptor>>, AuthError> {
    Ok(Json(auth.providers().await?))
}

async fn csrf(State(auth): State<AuthHandle>, headers: HeaderMap) -> Result<Response, AuthError> {
    let issue = auth.csrf_token(&headers).await?;
    let cookie = auth.csrf_cookie(&issue).map(|c| (SET_COOKIE, c));

    Ok((
        AppendHeaders(cookie),
        Json(serde_json::json!({ "csrfToken": issue.token.as_str() })),
    )
        .into_response())
}

async fn session(State(auth): State<AuthHandle>, headers: HeaderMap) -> Result<Response, AuthError> {
    Ok(match auth.touch_session(&headers).await? {
        Some((session, cookie)) => {
            (AppendHeaders(cookie.map(|c| (SET_COOKIE, c))), Json(session)).into_response()
        }
        None => Json(serde_json::Map::new()).into_response(),
    })
}

async fn signin_page(State(auth): State<AuthHandle>) -> Redirect {
    Redirect::to(&auth.options().pages().sign_in)
}

/// Begin sign-in: verify the form, then redirect to the provider
async fn begin_signin(
    State(auth): State<AuthHandle>,
    Path(provider_id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<SignInForm>,
) -> Result<Response, AuthError> {
    auth.verify_csrf(&headers, form.csrf_token.as_deref())?;

    let options = auth.options();
    let provider = options
        .provider(&provider_id)
        .ok_or_else(|| AuthError::UnknownProvider(provider_id.clone()))?;
    let callback_url = resolve_callback_url(form.callback_url.as_deref(), options.base_url());

    match provider {
        Provider::OAuth(oauth) => {
            let base = BaseOAuthProvider::new(oauth, &options.redirect_uri(&oauth.id))?;
            let request = base.authorization_url();
            auth.flows().insert(
                request.state.clone(),
                oauth.id.as_str(),
                request.pkce_verifier,
                callback_url,
            );

            tracing::info!(provider = %oauth.id, "Sign-in started");
            let state_cookie = options.cookies().build(
                &state_cookie_name(&request.state),
                &oauth.id,
                Some(FLOW_TTL.as_secs()),
            );
            Ok((
                AppendHeaders([(SET_COOKIE, state_cookie)]),
                Redirect::to(&request.url),
            )
                .into_response())
        }
        // credentials are posted straight to the callback route
        Provider::Credentials(_) => Ok(Redirect::to(&options.pages().sign_in).into_response()),
    }
}

async fn oauth_callback(
    State(auth): State<AuthHandle>,
    Path(provider_id): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(Provider::OAuth(provider)) = auth.options().provider(&provider_id) else {
        return AuthError::UnknownProvider(provider_id).into_response();
    };

    let state = query.state.clone();
    match complete_oauth(&auth, provider, query, &headers).await {
        Ok(response) => response,
        Err(err) => auth.callback_failure(&provider_id, state.as_deref(), err),
    }
}

async fn complete_oauth(
    auth: &AuthHandle,
    provider: &OAuthProvider,
    query: OAuthCallbackQuery,
    headers: &HeaderMap,
) -> Result<Response, AuthError> {
    if let Some(error) = query.error {
        return Err(OAuthError::ProviderDenied(error).into());
    }
    let code = query
        .code
        .ok_or_else(|| AuthError::InvalidCallback("missing code".into()))?;
    let state = query
        .state
        .ok_or_else(|| AuthError::InvalidCallback("missing state".into()))?;
    if !is_state_token(&state) {
        return Err(OAuthError::InvalidState.into());
    }

    // the state must come back to the browser that started the flow
    let state_cookie = state_cookie_name(&state);
    if read_cookie(headers, &state_cookie) != Some(provider.id.as_str()) {
        return Err(OAuthError::InvalidState.into());
    }
    let flow = auth.flows().take(&state, &provider.id)?;

    let options = auth.options();
    let base = BaseOAuthProvider::new(provider, &options.redirect_uri(&provider.id))?;
    let token = base.exchange_code(&code, &flow.pkce_verifier).await?;
    let info = fetch_user_info(provider, &base, &token.access_token).await?;

    let current_user = auth.current_user_id(headers).await?;
    let user = resolve_user(
        options.adapter().as_ref(),
        &SignInProfile::from_oauth(&provider.id, info),
        Some(&token),
        current_user.as_deref(),
    )
    .await?;

    let session_cookie = auth.create_session(&user.id).await?;
    tracing::info!(provider = %provider.id, user_id = %user.id, "Sign-in completed");

    Ok((
        AppendHeaders([
            (SET_COOKIE, session_cookie),
            (SET_COOKIE, options.cookies().expire(&state_cookie)),
        ]),
        Redirect::to(&flow.callback_url),
    )
        .into_response())
}

/// Credentials submission
async fn credentials_callback(
    State(auth): State<AuthHandle>,
    Path(provider_id): Path<String>,
    headers: HeaderMap,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    if let Err(err) = auth.verify_csrf(&headers, fields.get(CSRF_FORM_FIELD).map(String::as_str)) {
        return err.into_response();
    }

    match complete_credentials(&auth, &provider_id, &fields, &headers).await {
        Ok(response) => response,
        Err(err) => auth.callback_failure(&provider_id, None, err),
    }
}

async fn complete_credentials(
    auth: &AuthHandle,
    provider_id: &str,
    fields: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<Response, AuthError> {
    let options = auth.options();
    let provider = match options.provider(provider_id) {
        Some(Provider::Credentials(provider)) => provider,
        Some(Provider::OAuth(_)) => {
            return Err(AuthError::InvalidCallback(
                "OAuth providers do not accept form posts".into(),
            ))
        }
        None => return Err(AuthError::UnknownProvider(provider_id.to_string())),
    };

    let Some(verified) = provider.verify(fields).await? else {
        tracing::warn!(provider = %provider_id, "Credentials rejected");
        return Ok(Redirect::to(&options.sign_in_error_url("CredentialsSignin")).into_response());
    };

    let current_user = auth.current_user_id(headers).await?;
    let user = resolve_user(
        options.adapter().as_ref(),
        &SignInProfile::from_credentials(provider_id, verified),
        None,
        current_user.as_deref(),
    )
    .await?;

    let session_cookie = auth.create_session(&user.id).await?;
    tracing::info!(provider = %provider_id, user_id = %user.id, "Sign-in completed");

    let callback_url = resolve_callback_url(
        fields.get("callbackUrl").map(String::as_str),
        options.base_url(),
    );
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie)]),
        Redirect::to(&callback_url),
    )
        .into_response())
}

async fn signout(
    State(auth): State<AuthHandle>,
    headers: HeaderMap,
    Form(form): Form<SignInForm>,
) -> Result<Response, AuthError> {
    auth.verify_csrf(&headers, form.csrf_token.as_deref())?;

    let options = auth.options();
    if let Some(token) = read_cookie(&headers, SESSION_COOKIE) {
        options.adapter().delete_session(token).await?;
        tracing::info!("Session deleted");
    }

    let callback_url = resolve_callback_url(form.callback_url.as_deref(), options.base_url());
    Ok((
        AppendHeaders([(SET_COOKIE, options.cookies().expire(SESSION_COOKIE))]),
        Redirect::to(&callback_url),
    )
        .into_response())
}
