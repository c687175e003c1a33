use crate::application_port::*;
use crate::client::SessionState;
use crate::domain_model::*;
use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FakeTokenConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

impl Default for FakeTokenConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::from_secs(5 * 60),
            refresh_ttl: Duration::from_secs(24 * 60 * 60),
            signing_key: b"taskdeck-fake-signing-key".to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FakeClaims {
    token_type: String,
    exp: i64,
    iat: i64,
    jti: String,
    user_id: i64,
}

struct FakeAccount {
    id: i64,
    email: String,
    password: String,
}

/// Issues signed JWTs locally instead of calling the backend. Performs the
/// same store and session side effects as the real gateway.
pub struct FakeAuthGateway {
    session: Arc<SessionState>,
    config: FakeTokenConfig,
    accounts: DashMap<String, FakeAccount>,
    next_id: AtomicI64,
    refresh_calls: AtomicUsize,
}

impl FakeAuthGateway {
    pub fn new(session: Arc<SessionState>, config: FakeTokenConfig) -> Self {
        Self {
            session,
            config,
            accounts: DashMap::new(),
            next_id: AtomicI64::new(1),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn mint(&self, token_type: &str, user_id: i64, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = FakeClaims {
            token_type: token_type.to_string(),
            exp: now + ttl.as_secs() as i64,
            iat: now,
            jti: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.config.signing_key),
        )
        .map_err(|e| AuthError::Decode(e.to_string()))
    }

    fn verify_refresh(&self, token: &RefreshToken) -> Result<FakeClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<FakeClaims>(
            token.as_str(),
            &DecodingKey::from_secret(&self.config.signing_key),
            &validation,
        )
        .map_err(|_| token_not_valid())?;
        if data.claims.token_type != "refresh" {
            return Err(token_not_valid());
        }
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl AuthGateway for FakeAuthGateway {
    async fn register(&self, input: RegisterInput) -> Result<Profile, AuthError> {
        let mut errors = serde_json::Map::new();
        if input.username.is_empty() {
            errors.insert("username".into(), json!(["This field may not be blank."]));
        } else if self.accounts.contains_key(&input.username) {
            errors.insert(
                "username".into(),
                json!(["A user with that username already exists."]),
            );
        }
        if input.password.len() < 8 {
            errors.insert(
                "password".into(),
                json!(["Ensure this field has at least 8 characters."]),
            );
        }
        if !errors.is_empty() {
            return Err(AuthError::Rejected {
                status: 400,
                body: errors.into(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.accounts.insert(
            input.username.clone(),
            FakeAccount {
                id,
                email: input.email.clone(),
                password: input.password,
            },
        );
        Ok(Profile {
            id,
            username: input.username,
            email: input.email,
        })
    }

    async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError> {
        if input.username.is_empty() || input.password.is_empty() {
            return Err(AuthError::Rejected {
                status: 400,
                body: json!({ "detail": "Username and password are required." }),
            });
        }
        // Unknown usernames are accepted so the fake works without a prior register.
        let user_id = match self.accounts.get(&input.username) {
            Some(account) if account.password != input.password => {
                return Err(AuthError::Rejected {
                    status: 401,
                    body: json!({ "detail": "No active account found with the given credentials" }),
                });
            }
            Some(account) => account.id,
            None => 0,
        };

        let pair = TokenPair {
            access: AccessToken::new(self.mint("access", user_id, self.config.access_ttl)?),
            refresh: RefreshToken::new(self.mint("refresh", user_id, self.config.refresh_ttl)?),
        };
        self.session
            .store()
            .set(Some(pair.access.clone()), Some(pair.refresh.clone()))?;
        self.session.activate(&pair.access);
        tracing::info!(username = %input.username, "logged in (fake backend)");
        Ok(pair)
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, AuthError> {
        let refresh = self
            .session
            .store()
            .get_refresh()
            .ok_or(AuthError::MissingRefreshToken)?;
        let calls = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(calls, "fake refresh requested");

        let claims = self.verify_refresh(&refresh)?;
        let access = AccessToken::new(self.mint("access", claims.user_id, self.config.access_ttl)?);
        self.session.store().set(Some(access.clone()), None)?;
        self.session.activate(&access);
        Ok(access)
    }

    async fn forgot_password(&self, email: &str) -> Result<Ack, AuthError> {
        let known = self.accounts.iter().any(|entry| entry.value().email == email);
        tracing::debug!(known, "fake password reset requested");
        Ok(Ack {
            detail: "If an account exists for this email, a reset link has been sent.".into(),
        })
    }

    async fn reset_password(&self, input: ResetPasswordInput) -> Result<Ack, AuthError> {
        if input.uid.is_empty() || input.token.is_empty() {
            return Err(AuthError::Rejected {
                status: 400,
                body: json!({ "detail": "Invalid reset link." }),
            });
        }
        if input.new_password.len() < 8 {
            return Err(AuthError::Rejected {
                status: 400,
                body: json!({ "new_password": ["Ensure this field has at least 8 characters."] }),
            });
        }
        Ok(Ack {
            detail: "Password has been reset.".into(),
        })
    }

    fn logout(&self) {
        self.session.logout();
    }
}

fn token_not_valid() -> AuthError {
    AuthError::Rejected {
        status: 401,
        body: json!({
            "detail": "Token is invalid or expired",
            "code": "token_not_valid",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ActiveCredential;
    use crate::domain_port::TokenStore;
    use crate::infra::MemoryTokenStore;

    fn fake(config: FakeTokenConfig) -> (FakeAuthGateway, Arc<SessionState>) {
        let session = Arc::new(SessionState::new(
            Arc::new(MemoryTokenStore::new()),
            Arc::new(ActiveCredential::new()),
        ));
        (FakeAuthGateway::new(session.clone(), config), session)
    }

    fn login(username: &str, password: &str) -> LoginInput {
        LoginInput {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_issues_tokens_the_session_accepts() {
        let (gateway, session) = fake(FakeTokenConfig::default());
        let pair = gateway.login(login("ada", "pw")).await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.credential().current(), Some(pair.access));
    }

    #[tokio::test]
    async fn zero_ttl_access_is_immediately_expired() {
        let (gateway, session) = fake(FakeTokenConfig {
            access_ttl: Duration::ZERO,
            ..Default::default()
        });
        gateway.login(login("ada", "pw")).await.unwrap();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_mints_new_access_and_keeps_refresh() {
        let (gateway, session) = fake(FakeTokenConfig::default());
        let pair = gateway.login(login("ada", "pw")).await.unwrap();

        let access = gateway.refresh_access_token().await.unwrap();
        assert_eq!(gateway.refresh_calls(), 1);
        assert_eq!(session.store().get_refresh(), Some(pair.refresh));
        assert_eq!(session.store().get_access(), Some(access));
    }

    #[tokio::test]
    async fn tampered_refresh_token_is_rejected() {
        let (gateway, session) = fake(FakeTokenConfig::default());
        gateway.login(login("ada", "pw")).await.unwrap();
        let forged = {
            let (other, _) = fake(FakeTokenConfig {
                signing_key: b"someone-else".to_vec(),
                ..Default::default()
            });
            other.mint("refresh", 1, Duration::from_secs(60)).unwrap()
        };
        session
            .store()
            .set(None, Some(RefreshToken::new(forged)))
            .unwrap();

        let err = gateway.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let (gateway, session) = fake(FakeTokenConfig::default());
        let pair = gateway.login(login("ada", "pw")).await.unwrap();
        session
            .store()
            .set(None, Some(RefreshToken::new(pair.access.as_str())))
            .unwrap();
        assert!(gateway.refresh_access_token().await.is_err());
    }

    #[tokio::test]
    async fn registered_password_is_checked() {
        let (gateway, _session) = fake(FakeTokenConfig::default());
        let profile = gateway
            .register(RegisterInput {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(profile.id, 1);

        assert!(gateway.login(login("ada", "wrong")).await.is_err());
        assert!(gateway.login(login("ada", "correct-horse")).await.is_ok());

        let err = gateway
            .register(RegisterInput {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }
}
