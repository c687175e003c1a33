use crate::api::v1::*;
use crate::application_port::*;
use crate::client::SessionState;
use crate::domain_model::*;
use crate::domain_port::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Talks to the `/api/auth/` endpoints over the bare transport. These calls
/// never carry a bearer token and never trigger a refresh.
pub struct RealAuthGateway {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionState>,
}

impl RealAuthGateway {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<SessionState>) -> Self {
        Self { transport, session }
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, AuthError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Default,
    {
        let body = serde_json::to_value(body).map_err(|e| AuthError::Decode(e.to_string()))?;
        let response = self
            .transport
            .send(&HttpRequest::post(path).with_json(body))
            .await?;

        if !response.is_success() {
            tracing::debug!(path, status = response.status, "auth request rejected");
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.body_json(),
            });
        }
        if response.body.is_empty() {
            return Ok(T::default());
        }
        response
            .json()
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthGateway for RealAuthGateway {
    async fn register(&self, input: RegisterInput) -> Result<Profile, AuthError> {
        let request = RegisterRequest {
            username: &input.username,
            email: &input.email,
            password: &input.password,
        };
        let profile: Option<Profile> = self.post(REGISTER, &request).await?;
        let profile = profile.ok_or_else(|| AuthError::Decode("empty register response".into()))?;
        tracing::info!(username = %profile.username, "registered");
        Ok(profile)
    }

    async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError> {
        let request = LoginRequest {
            username: &input.username,
            password: &input.password,
        };
        let response: Option<LoginResponse> = self.post(LOGIN, &request).await?;
        let response = response.ok_or_else(|| AuthError::Decode("empty login response".into()))?;

        self.session
            .store()
            .set(Some(response.access.clone()), Some(response.refresh.clone()))?;
        self.session.activate(&response.access);
        tracing::info!(username = %input.username, "logged in");

        Ok(TokenPair {
            access: response.access,
            refresh: response.refresh,
        })
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, AuthError> {
        let refresh = self
            .session
            .store()
            .get_refresh()
            .ok_or(AuthError::MissingRefreshToken)?;

        let request = RefreshRequest {
            refresh: refresh.as_str(),
        };
        let response: Option<RefreshResponse> = self.post(REFRESH, &request).await?;
        let access = response
            .ok_or_else(|| AuthError::Decode("empty refresh response".into()))?
            .access;

        self.session.store().set(Some(access.clone()), None)?;
        self.session.activate(&access);
        Ok(access)
    }

    async fn forgot_password(&self, email: &str) -> Result<Ack, AuthError> {
        self.post(FORGOT_PASSWORD, &ForgotPasswordRequest { email }).await
    }

    async fn reset_password(&self, input: ResetPasswordInput) -> Result<Ack, AuthError> {
        let request = ResetPasswordRequest {
            uid: &input.uid,
            token: &input.token,
            new_password: &input.new_password,
        };
        self.post(RESET_PASSWORD, &request).await
    }

    fn logout(&self) {
        self.session.logout();
    }
}
