//! In-process adapter

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    normalize_email, Adapter, AdapterAccount, AdapterError, AdapterResult, AdapterSession,
    AdapterUser, NewUser,
};

#[derive(Debug, Default)]
struct Store {
    users: HashMap<String, AdapterUser>,
    // (provider, provider_account_id) -> account
    accounts: HashMap<(String, String), AdapterAccount>,
    sessions: HashMap<String, AdapterSession>,
}

/// Adapter keeping everything in memory
///
/// Data is lost on restart; intended for development and tests.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    store: RwLock<Store>,
}

impl MemoryAdapter {
    /// Create an empty adapter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.store.read().sessions.len()
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn create_user(&self, user: NewUser) -> AdapterResult<AdapterUser> {
        let email = user.email.as_deref().map(normalize_email);
        let mut store = self.store.write();
        if let Some(email) = &email {
            if store.users.values().any(|u| u.email.as_ref() == Some(email)) {
                return Err(AdapterError::Backend(format!(
                    "a user with email {email} already exists"
                )));
            }
        }

        let user = AdapterUser {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email,
            email_verified: user.email_verified,
            image: user.image,
        };
        store.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> AdapterResult<Option<AdapterUser>> {
        Ok(self.store.read().users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<AdapterUser>> {
        let email = normalize_email(email);
        Ok(self
            .store
            .read()
            .users
            .values()
            .find(|u| u.email.as_ref() == Some(&email))
            .cloned())
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<AdapterUser>> {
        let store = self.store.read();
        Ok(store
            .accounts
            .get(&(provider.to_string(), provider_account_id.to_string()))
            .and_then(|account| store.users.get(&account.user_id))
            .cloned())
    }

    async fn update_user(&self, mut user: AdapterUser) -> AdapterResult<AdapterUser> {
        user.email = user.email.as_deref().map(normalize_email);
        let mut store = self.store.write();
        let stored = store
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AdapterError::NotFound(format!("user {}", user.id)))?;
        *stored = user.clone();
        Ok(user)
    }

    async fn link_account(&self, account: AdapterAccount) -> AdapterResult<()> {
        let mut store = self.store.write();
        if !store.users.contains_key(&account.user_id) {
            return Err(AdapterError::NotFound(format!("user {}", account.user_id)));
        }
        store.accounts.insert(
            (account.provider.clone(), account.provider_account_id.clone()),
            account,
        );
        Ok(())
    }

    async fn create_session(&self, session: AdapterSession) -> AdapterResult<AdapterSession> {
        self.store
            .write()
            .sessions
            .insert(session.session_token.clone(), session.clone());
        Ok(session)
    }

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> AdapterResult<Option<(AdapterSession, AdapterUser)>> {
        let store = self.store.read();
        Ok(store.sessions.get(session_token).and_then(|session| {
            store
                .users
                .get(&session.user_id)
                .map(|user| (session.clone(), user.clone()))
        }))
    }

    async fn update_session(
        &self,
        session: AdapterSession,
    ) -> AdapterResult<Option<AdapterSession>> {
        let mut store = self.store.write();
        Ok(store
            .sessions
            .get_mut(&session.session_token)
            .map(|stored| {
                stored.expires = session.expires;
                stored.clone()
            }))
    }

    async fn delete_session(&self, session_token: &str) -> AdapterResult<()> {
        self.store.write().sessions.remove(session_token);
        Ok(())
    }
}
