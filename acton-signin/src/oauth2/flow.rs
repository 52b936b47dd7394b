//! Pending OAuth2 flows
//!
//! Between "begin sign-in" and the provider callback the server remembers the
//! PKCE verifier and the post-login destination, keyed by the random `state`
//! parameter. Entries are single use and expire after ten minutes; at most
//! [`MAX_PENDING_FLOWS`] are kept, the oldest giving way first.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::types::OAuthError;

/// Lifetime of a pending flow
pub const FLOW_TTL: Duration = Duration::from_secs(600);

/// Upper bound on flows held at once
pub const MAX_PENDING_FLOWS: usize = 10_000;

/// A sign-in that was started but has not come back from the provider yet
#[derive(Debug, Clone)]
pub struct PendingFlow {
    /// Provider the flow was started for
    pub provider_id: String,
    /// PKCE verifier matching the challenge sent to the provider
    pub pkce_verifier: String,
    /// Where to send the browser after the session is created
    pub callback_url: String,
    expires_at: Instant,
}

/// In-memory store of pending flows
#[derive(Debug)]
pub struct FlowStore {
    flows: Mutex<HashMap<String, PendingFlow>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for FlowStore {
    fn default() -> Self {
        Self::with_ttl(FLOW_TTL)
    }
}

impl FlowStore {
    /// Create a store with a custom time-to-live
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_limits(ttl, MAX_PENDING_FLOWS)
    }

    /// Create a store with a custom time-to-live and capacity
    #[must_use]
    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            flows: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Remember a flow under its state token
    pub fn insert(
        &self,
        state: String,
        provider_id: impl Into<String>,
        pkce_verifier: String,
        callback_url: String,
    ) {
        let flow = PendingFlow {
            provider_id: provider_id.into(),
            pkce_verifier,
            callback_url,
            expires_at: Instant::now() + self.ttl,
        };

        let mut flows = self.flows.lock();
        Self::cleanup_expired(&mut flows);
        while flows.len() >= self.capacity {
            let Some(oldest) = flows
                .iter()
                .min_by_key(|(_, flow)| flow.expires_at)
                .map(|(state, _)| state.clone())
            else {
                break;
            };
            tracing::debug!("Pending flow limit reached, dropping the oldest");
            flows.remove(&oldest);
        }
        flows.insert(state, flow);
    }

    /// Remove and return the flow for `state`
    ///
    /// # Errors
    ///
    /// - [`OAuthError::InvalidState`] if the state is unknown or was started
    ///   for a different provider (the flow is consumed either way)
    /// - [`OAuthError::StateExpired`] if the flow is too old
    pub fn take(&self, state: &str, provider_id: &str) -> Result<PendingFlow, OAuthError> {
        let flow = {
            let mut flows = self.flows.lock();
            let flow = flows.remove(state);
            Self::cleanup_expired(&mut flows);
            flow.ok_or(OAuthError::InvalidState)?
        };

        if flow.expires_at <= Instant::now() {
            return Err(OAuthError::StateExpired);
        }
        if flow.provider_id != provider_id {
            return Err(OAuthError::InvalidState);
        }
        Ok(flow)
    }

    /// Number of flows currently stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.flows.lock().len()
    }

    /// Whether no flows are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cleanup_expired(flows: &mut HashMap<String, PendingFlow>) {
        let now = Instant::now();
        flows.retain(|_, flow| flow.expires_at > now);
    }
}
