//! Askama templates for the sign-in and home pages

use askama::Template;
use axum::response::Html;

use super::view::ProviderButton;
use crate::error::AuthError;

/// Render a template into an HTML body
pub trait RenderHtml: Template {
    /// Render, keeping the error for the caller
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Template`] if rendering fails.
    fn render_html(&self) -> Result<Html<String>, AuthError> {
        Ok(Html(self.render()?))
    }
}

impl<T: Template> RenderHtml for T {}

/// The provider selection page
#[derive(Template)]
#[template(path = "signin.html")]
pub struct SignInTemplate<'a> {
    /// Page title
    pub app_name: &'a str,
    /// One per provider, in order
    pub buttons: &'a [ProviderButton],
    /// Anti-forgery token posted by every button
    pub csrf_token: &'a str,
    /// Where to land after sign-in
    pub callback_url: &'a str,
    /// Message for a failed attempt
    pub error: Option<&'static str>,
    /// Polled once after load
    pub session_url: &'a str,
    /// Redirect target once signed in
    pub home: &'a str,
}

/// The landing page
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate<'a> {
    /// Page title
    pub app_name: &'a str,
    /// Display name of the signed-in user
    pub user: Option<&'a str>,
    /// Anti-forgery token for the sign-out form
    pub csrf_token: &'a str,
    /// Sign-out route
    pub signout_url: &'a str,
    /// Sign-in page route
    pub sign_in_url: &'a str,
}

/// Human readable text for a sign-in error code
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "OAuthSignin" | "OAuthCallback" | "OAuthCreateAccount" | "Callback" => {
            "Try signing in with a different account."
        }
        "OAuthAccountNotLinked" => {
            "To confirm your identity, sign in with the same account you used originally."
        }
        "CredentialsSignin" => "Sign in failed. Check the details you provided are correct.",
        _ => "Unable to sign in.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::icons::icon_for;
    use proptest::prelude::*;

    fn button(id: &str, name: &str) -> ProviderButton {
        ProviderButton {
            id: id.to_string(),
            label: format!("Continue with {name}"),
            action: format!("/api/auth/signin/{id}"),
            icon: icon_for(id),
            fields: Vec::new(),
        }
    }

    fn render(buttons: &[ProviderButton], error: Option<&'static str>) -> String {
        SignInTemplate {
            app_name: "Example",
            buttons,
            csrf_token: "token123",
            callback_url: "/",
            error,
            session_url: "/api/auth/session",
            home: "/",
        }
        .render()
        .unwrap()
    }

    #[test]
    fn test_empty_provider_list_renders_page() {
        let html = render(&[], None);
        assert!(html.contains("Sign in to unlock the"));
        assert!(html.contains("<title>Sign in | Example</title>"));
        assert!(!html.contains("data-provider-id="));
        assert!(!html.contains("role=\"alert\""));
    }

    #[test]
    fn test_buttons_carry_form_fields() {
        let html = render(&[button("github", "GitHub"), button("google", "Google")], None);

        assert!(html.contains(r#"action="/api/auth/signin/google""#));
        assert!(html.contains(r#"name="csrfToken" value="token123""#));
        assert!(html.contains("https://tailus.io/sources/blocks/social/preview/images/google.svg"));
        assert!(html.contains("google logo"));
        assert!(html.find("Continue with GitHub") < html.find("Continue with Google"));
    }

    #[test]
    fn test_error_message_is_shown() {
        let html = render(&[], Some(error_message("CredentialsSignin")));
        assert!(html.contains("Sign in failed."));
    }

    #[test]
    fn test_unknown_error_codes_get_generic_message() {
        assert_eq!(error_message("Nope"), "Unable to sign in.");
        assert_eq!(
            error_message("OAuthAccountNotLinked"),
            "To confirm your identity, sign in with the same account you used originally."
        );
    }

    #[test]
    fn test_names_are_escaped() {
        let html = render(&[button("evil", "<script>")], None);
        assert!(!html.contains("Continue with <script>"));
    }

    #[test]
    fn test_home_shows_user_or_link() {
        let signed_in = HomeTemplate {
            app_name: "Example",
            user: Some("Jane"),
            csrf_token: "t",
            signout_url: "/api/auth/signout",
            sign_in_url: "/user/authentication",
        }
        .render()
        .unwrap();
        assert!(signed_in.contains("<title>Example</title>"));
        assert!(signed_in.contains("Jane"));
        assert!(signed_in.contains("Sign out"));

        let anonymous = HomeTemplate {
            app_name: "Example",
            user: None,
            csrf_token: "t",
            signout_url: "/api/auth/signout",
            sign_in_url: "/user/authentication",
        }
        .render()
        .unwrap();
        assert!(anonymous.contains("You are not signed in."));
    }

    proptest! {
        #[test]
        fn prop_one_button_per_provider(names in prop::collection::vec("[A-Za-z]{1,12}", 0..8)) {
            let buttons: Vec<_> = names
                .iter()
                .enumerate()
                .map(|(i, name)| button(&format!("p{i}"), name))
                .collect();
            let html = render(&buttons, None);

            prop_assert_eq!(html.matches("data-provider-id=").count(), names.len());
            for name in &names {
                let label = format!("Continue with {name}");
                prop_assert!(html.contains(&label));
            }
        }
    }
}
