use super::SessionState;
use crate::application_port::*;
use crate::domain_model::*;
use std::mem;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type RefreshOutcome = Result<AccessToken, AuthError>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Coalesces concurrent refresh triggers into one gateway call whose outcome
/// is shared by every caller that arrived while it was in flight.
pub struct RefreshCoordinator {
    gateway: Arc<dyn AuthGateway>,
    session: Arc<SessionState>,
    state: Mutex<RefreshState>,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
    pub fn new(gateway: Arc<dyn AuthGateway>, session: Arc<SessionState>) -> Self {
        Self {
            gateway,
            session,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Returns a fresh access token, joining the in-flight refresh if there is
    /// one. A failed refresh logs the session out before the error is returned.
    pub async fn refresh(&self) -> RefreshOutcome {
        match self.claim() {
            Role::Leader => self.lead().await,
            Role::Waiter(rx) => {
                tracing::debug!("refresh in flight; waiting for its outcome");
                rx.await.unwrap_or(Err(AuthError::RefreshAbandoned))
            }
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    pub fn waiter_count(&self) -> usize {
        self.lock().waiters.len()
    }

    fn claim(&self) -> Role {
        let mut state = self.lock();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            Role::Waiter(rx)
        } else {
            state.refreshing = true;
            Role::Leader
        }
    }

    async fn lead(&self) -> RefreshOutcome {
        let mut in_flight = InFlight {
            coordinator: self,
            settled: false,
        };

        tracing::debug!("refreshing access token");
        let outcome = self.gateway.refresh_access_token().await;
        match &outcome {
            Ok(_) => tracing::info!("access token refreshed"),
            Err(e) => tracing::warn!(error = %e, "access token refresh failed"),
        }

        in_flight.settle(&outcome);
        if outcome.is_err() {
            self.session.logout();
        }
        outcome
    }

    /// Clears the flag and hands `outcome` to every waiter in one critical
    /// section, so nobody can queue behind a refresh that already finished.
    fn finish(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            mem::take(&mut state.waiters)
        };
        if !waiters.is_empty() {
            tracing::debug!(waiters = waiters.len(), "releasing queued requests");
        }
        for waiter in waiters {
            // A waiter whose request was dropped has nobody left to tell.
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Resets the coordinator even when the leading future is dropped mid-refresh.
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: &RefreshOutcome) {
        self.settled = true;
        self.coordinator.finish(outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("refresh abandoned before completion");
            self.coordinator.finish(&Err(AuthError::RefreshAbandoned));
        }
    }
}
