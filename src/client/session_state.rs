use super::{ActiveCredential, AuthSignal, Subscription};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;

/// Derives "authenticated" from the stored access token and announces every
/// change after the store mutation that caused it.
pub struct SessionState {
    store: Arc<dyn TokenStore>,
    credential: Arc<ActiveCredential>,
    signal: AuthSignal,
}

impl SessionState {
    pub fn new(store: Arc<dyn TokenStore>, credential: Arc<ActiveCredential>) -> Self {
        Self {
            store,
            credential,
            signal: AuthSignal::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn credential(&self) -> &Arc<ActiveCredential> {
        &self.credential
    }

    /// True when an access token is stored and its `exp` lies in the future.
    /// A malformed or expired token is purged. Never fails.
    pub fn is_authenticated(&self) -> bool {
        self.valid_access().is_some()
    }

    /// Unverified claims of the current token, if it is still valid.
    pub fn claims(&self) -> Option<Claims> {
        self.valid_access().map(|(_, claims)| claims)
    }

    /// Startup check: activates a valid stored token, purges anything else,
    /// and announces the outcome once either way.
    pub fn init_from_storage(&self) -> bool {
        let valid = match self.valid_access() {
            Some((access, claims)) => {
                tracing::debug!(expires_at = ?claims.expires_at(), "restored session from storage");
                self.credential.activate(access);
                true
            }
            None => {
                self.purge();
                false
            }
        };
        self.announce();
        valid
    }

    pub fn logout(&self) {
        self.purge();
        tracing::info!("logged out");
        self.announce();
    }

    /// Makes `access` the outbound credential and announces the change. The
    /// caller has already written it to the store.
    pub fn activate(&self, access: &AccessToken) {
        self.credential.activate(access.clone());
        self.announce();
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.signal.subscribe(listener)
    }

    fn valid_access(&self) -> Option<(AccessToken, Claims)> {
        let access = self.store.get_access()?;
        let now = Utc::now().timestamp_millis();
        match decode_unverified_claims(access.as_str()) {
            Ok(claims) if !claims.is_expired_at(now) => Some((access, claims)),
            Ok(claims) => {
                tracing::debug!(exp = ?claims.exp, "stored access token expired");
                self.purge();
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "stored access token is malformed");
                self.purge();
                None
            }
        }
    }

    fn purge(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear stored tokens");
        }
        self.credential.deactivate();
    }

    fn announce(&self) {
        self.signal.publish();
    }
}
