//! View model of the sign-in page
//!
//! [`SignInView`] follows one page load: it starts in `Loading`, becomes
//! `Interactive` or `Redirect` once the server reads are in, and an
//! `Interactive` page still turns into `Redirect` if the browser's session
//! re-check reports a sign-in made elsewhere.

use super::decision::{decide, PageDecision, SessionStatus};
use super::icons::{icon_for, ProviderIcon};
use crate::auth::{credentials::CredentialField, ProviderDescriptor, Session};

/// One "Continue with ..." button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderButton {
    /// Provider id
    pub id: String,
    /// Button text
    pub label: String,
    /// Route the button's form posts to
    pub action: String,
    /// Icon
    pub icon: ProviderIcon,
    /// Extra inputs, credentials providers only
    pub fields: Vec<CredentialField>,
}

impl From<&ProviderDescriptor> for ProviderButton {
    fn from(provider: &ProviderDescriptor) -> Self {
        Self {
            id: provider.id.clone(),
            label: format!("Continue with {}", provider.name),
            action: provider.form_action().to_string(),
            icon: icon_for(&provider.id),
            fields: provider.fields.clone(),
        }
    }
}

/// State of one sign-in page load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInView {
    /// Server reads in flight
    Loading,
    /// Buttons shown, one per provider in order
    Interactive(Vec<ProviderButton>),
    /// Leaving for another route
    Redirect(&'static str),
}

impl SignInView {
    /// Leave `Loading` with the results of the server reads
    #[must_use]
    pub fn loaded(session: Option<&Session>, providers: &[ProviderDescriptor]) -> Self {
        match decide(SessionStatus::from(session)) {
            PageDecision::Redirect(to) => Self::Redirect(to),
            PageDecision::Render => {
                Self::Interactive(providers.iter().map(ProviderButton::from).collect())
            }
        }
    }

    /// Apply a client-side session status report
    ///
    /// `Redirect` is terminal.
    #[must_use]
    pub fn on_status(self, status: SessionStatus) -> Self {
        match (self, decide(status)) {
            (Self::Redirect(to), _) | (_, PageDecision::Redirect(to)) => Self::Redirect(to),
            (view, PageDecision::Render) => view,
        }
    }

    /// Buttons currently shown
    #[must_use]
    pub fn buttons(&self) -> &[ProviderButton] {
        match self {
            Self::Interactive(buttons) => buttons,
            Self::Loading | Self::Redirect(_) => &[],
        }
    }
}
