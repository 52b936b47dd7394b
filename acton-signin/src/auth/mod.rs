//! Authentication configuration and the `/api/auth` handler
//!
//! [`AuthOptions`] declares the enabled providers, the storage adapter and
//! the sign-in page route. [`AuthHandle`] wraps it for request handlers, and
//! [`handler::routes`] serves the provider handshake, session and sign-out
//! endpoints.

pub mod account;
pub mod adapter;
pub mod callback_url;
pub mod cookies;
pub mod credentials;
pub mod csrf;
pub mod extractors;
pub mod handle;
pub mod handler;
pub mod options;
pub mod providers;
pub mod session;

pub use adapter::{Adapter, AdapterError, MemoryAdapter, PgAdapter};
pub use credentials::{
    hash_password, CredentialField, CredentialsError, CredentialsProvider, CredentialsVerifier,
    LocalUserVerifier, VerifiedUser,
};
pub use csrf::CsrfToken;
pub use extractors::{Authenticated, AuthenticationError, OptionalAuth};
pub use handle::AuthHandle;
pub use options::{env_lookup, AuthOptions, AuthOptionsBuilder, Pages};
pub use providers::{Provider, ProviderDescriptor, ProviderKind, AUTH_BASE_PATH};
pub use session::{Session, SessionUser};
