use super::*;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra::*;
use crate::infra_file::*;
use crate::infra_http::*;
use crate::settings::{self, Settings};
use std::sync::Arc;
use std::time::Duration;

/// Composition root: one session, one refresh coordinator and the services
/// built on top of them.
pub struct Client {
    pub session: Arc<SessionState>,
    pub auth_gateway: Arc<dyn AuthGateway>,
    pub task_service: Arc<dyn TaskService>,
    pipeline: Arc<RequestPipeline>,
}

impl Client {
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn TokenStore> = match settings.storage.backend.as_str() {
            "file" => Arc::new(FileTokenStore::open(&settings.storage.path)?),
            "memory" => Arc::new(MemoryTokenStore::new()),
            other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        };

        // Fake tokens are signed locally; a remote backend would reject them.
        if settings.auth.backend == "fake" && !is_loopback(&settings.api.base_url) {
            return Err(anyhow::anyhow!(
                "The fake auth backend only works against a local API, not {}",
                settings.api.base_url
            ));
        }

        let timeout = Duration::from_secs(settings.api.timeout_secs);
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestHttpTransport::new(&settings.api.base_url, timeout)?);
        tracing::debug!(base_url = %settings.api.base_url, "configured backend");

        Self::from_parts(&settings.auth, store, transport)
    }

    /// Wires the client over an existing store and transport.
    pub fn from_parts(
        auth: &settings::Auth,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> anyhow::Result<Self> {
        let credential = Arc::new(ActiveCredential::new());
        let session = Arc::new(SessionState::new(store, credential.clone()));

        let auth_gateway: Arc<dyn AuthGateway> = match auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthGateway::new(
                session.clone(),
                FakeTokenConfig {
                    access_ttl: Duration::from_secs(auth.fake_access_ttl_secs),
                    refresh_ttl: Duration::from_secs(auth.fake_refresh_ttl_secs),
                    ..Default::default()
                },
            )),
            "real" => Arc::new(RealAuthGateway::new(transport.clone(), session.clone())),
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let coordinator = Arc::new(RefreshCoordinator::new(
            auth_gateway.clone(),
            session.clone(),
        ));
        let pipeline = Arc::new(RequestPipeline::new(transport, credential, coordinator));
        let task_service: Arc<dyn TaskService> = Arc::new(RealTaskService::new(pipeline.clone()));

        Ok(Self {
            session,
            auth_gateway,
            task_service,
            pipeline,
        })
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }
}

fn is_loopback(base_url: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(base_url) else {
        return false;
    };
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}
