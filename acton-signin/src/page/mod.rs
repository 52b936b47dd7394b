//! The sign-in page
//!
//! `GET /user/authentication` (or the configured `pages.sign_in` route)
//! lists the enabled providers as "Continue with ..." buttons. Visitors who
//! already have a session are redirected to [`HOME_ROUTE`], both on the
//! server and by a one-shot session check in the browser.

pub mod decision;
pub mod handler;
pub mod icons;
pub mod template;
pub mod view;

pub use decision::{decide, PageDecision, SessionStatus, HOME_ROUTE};
pub use handler::{home, sign_in_page, SignInQuery};
pub use icons::{icon_for, ProviderIcon};
pub use view::{ProviderButton, SignInView};
