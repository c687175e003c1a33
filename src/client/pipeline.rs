use super::{ActiveCredential, RefreshCoordinator};
use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestError {
    #[error("{method} {path} failed with status {status}: {body}")]
    Status {
        method: Method,
        path: String,
        status: u16,
        body: String,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("session could not be refreshed: {0}")]
    Refresh(#[source] AuthError),
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Refresh(AuthError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(UNAUTHORIZED)
    }

    /// The error body as JSON when the backend sent one.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        match self {
            RequestError::Status { body, .. } => serde_json::from_str(body).ok(),
            RequestError::Refresh(AuthError::Rejected { body, .. }) => Some(body.clone()),
            _ => None,
        }
    }
}

struct RequestAttempt {
    request: HttpRequest,
    retried: bool,
}

impl RequestAttempt {
    fn authorize(&mut self, token: Option<&AccessToken>) {
        match token {
            Some(token) => self.request.set_header(AUTHORIZATION, token.bearer()),
            None => self.request.remove_header(AUTHORIZATION),
        }
    }
}

/// Sends protected calls with the active bearer token and recovers from one
/// 401 per request by refreshing the session.
pub struct RequestPipeline {
    transport: Arc<dyn HttpTransport>,
    credential: Arc<ActiveCredential>,
    coordinator: Arc<RefreshCoordinator>,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credential: Arc<ActiveCredential>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            credential,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Success is any 2xx. A 401 is retried once with a refreshed token; every
    /// other failure, and a 401 on the retry, is returned as is.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let mut attempt = RequestAttempt {
            request,
            retried: false,
        };
        attempt.authorize(self.credential.current().as_ref());

        loop {
            tracing::debug!(
                method = %attempt.request.method,
                path = %attempt.request.path,
                retried = attempt.retried,
                "dispatching request"
            );
            let response = self.transport.send(&attempt.request).await?;

            if response.is_success() {
                return Ok(response);
            }
            if response.status != UNAUTHORIZED || attempt.retried {
                return Err(status_error(&attempt.request, response));
            }

            attempt.retried = true;
            let token = match self.newer_credential(&attempt.request) {
                Some(token) => {
                    tracing::debug!("token changed while request was in flight; replaying");
                    token
                }
                None => self
                    .coordinator
                    .refresh()
                    .await
                    .map_err(RequestError::Refresh)?,
            };
            attempt.authorize(Some(&token));
        }
    }

    /// The active token, when it differs from the one the 401 answered.
    fn newer_credential(&self, request: &HttpRequest) -> Option<AccessToken> {
        let current = self.credential.current()?;
        match request.bearer_token() {
            Some(sent) if sent == current.as_str() => None,
            _ => Some(current),
        }
    }
}

fn status_error(request: &HttpRequest, response: HttpResponse) -> RequestError {
    RequestError::Status {
        method: request.method,
        path: request.path.clone(),
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    }
}
