//! Fixtures shared by the unit tests.

use crate::application_port::*;
use crate::client::SessionState;
use crate::domain_model::*;
use crate::domain_port::*;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// A three-segment token whose payload is `payload` verbatim.
pub fn unsigned_token(payload: &str) -> String {
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

pub fn jwt_with_claims(claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

pub fn jwt_expiring_in(secs: i64) -> String {
    jwt_with_claims(serde_json::json!({
        "token_type": "access",
        "exp": Utc::now().timestamp() + secs,
        "user_id": 1,
    }))
}

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Answers requests from a closure and records every request it saw.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    log: Mutex<Vec<HttpRequest>>,
    hook: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            log: Mutex::new(Vec::new()),
            hook: Mutex::new(None),
        }
    }

    /// Runs `hook` after each request is answered and before the response is
    /// handed back.
    pub fn on_send(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        let response = (self.handler)(request);
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook();
        }
        response
    }
}

/// Gateway whose refresh blocks until the test releases it, then returns a
/// fixed outcome with the same side effects as the real one.
pub struct GatedGateway {
    session: Arc<SessionState>,
    outcome: Result<AccessToken, AuthError>,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl GatedGateway {
    pub fn new(session: Arc<SessionState>, outcome: Result<AccessToken, AuthError>) -> Self {
        Self {
            session,
            outcome,
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Lets one pending or future refresh complete.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait::async_trait]
impl AuthGateway for GatedGateway {
    async fn register(&self, _input: RegisterInput) -> Result<Profile, AuthError> {
        unimplemented!("not used by the refresh tests")
    }

    async fn login(&self, _input: LoginInput) -> Result<TokenPair, AuthError> {
        unimplemented!("not used by the refresh tests")
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate
            .acquire()
            .await
            .expect("gate is never closed")
            .forget();
        let access = self.outcome.clone()?;
        self.session.store().set(Some(access.clone()), None)?;
        self.session.activate(&access);
        Ok(access)
    }

    async fn forgot_password(&self, _email: &str) -> Result<Ack, AuthError> {
        unimplemented!("not used by the refresh tests")
    }

    async fn reset_password(&self, _input: ResetPasswordInput) -> Result<Ack, AuthError> {
        unimplemented!("not used by the refresh tests")
    }

    fn logout(&self) {
        self.session.logout();
    }
}
