use crate::domain_model::*;
use crate::domain_port::*;
use std::fmt;

/// `Clone` so one refresh outcome can be handed to every queued request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("no refresh token stored")]
    MissingRefreshToken,
    #[error("backend rejected the request with status {status}: {body}")]
    Rejected {
        status: u16,
        body: serde_json::Value,
    },
    #[error("network error: {0}")]
    Network(#[from] TransportError),
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error("token store error: {0}")]
    Store(String),
    #[error("token refresh was abandoned before it completed")]
    RefreshAbandoned,
}

impl AuthError {
    /// Field-level validation messages as sent by the backend, e.g.
    /// `{"username": ["A user with that username already exists."]}`.
    pub fn field_errors(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match self {
            AuthError::Rejected { body, .. } => body.as_object(),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::Store(error.to_string())
    }
}

#[derive(Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ResetPasswordInput {
    pub uid: String,
    pub token: String,
    pub new_password: String,
}

#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    async fn register(&self, input: RegisterInput) -> Result<Profile, AuthError>;
    /// Stores both tokens, activates the access token and announces the change.
    async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError>;
    /// Exchanges the stored refresh token for a new access token. Fails with
    /// `MissingRefreshToken` before any network call when none is stored, and
    /// leaves the store untouched when the backend refuses.
    async fn refresh_access_token(&self) -> Result<AccessToken, AuthError>;
    async fn forgot_password(&self, email: &str) -> Result<Ack, AuthError>;
    async fn reset_password(&self, input: ResetPasswordInput) -> Result<Ack, AuthError>;
    fn logout(&self);
}
