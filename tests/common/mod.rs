#![allow(dead_code)]

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use std::time::Duration;
use taskdeck::client::Client;
use taskdeck::domain_port::{HttpTransport, TokenStore};
use taskdeck::infra::MemoryTokenStore;
use taskdeck::infra_http::ReqwestHttpTransport;
use taskdeck::settings::Auth;
use wiremock::MockServer;

pub fn jwt_expiring_in(secs: i64) -> String {
    encode(
        &Header::default(),
        &serde_json::json!({
            "token_type": "access",
            "exp": Utc::now().timestamp() + secs,
            "user_id": 1,
        }),
        &EncodingKey::from_secret(b"integration-secret"),
    )
    .unwrap()
}

pub fn real_auth() -> Auth {
    Auth {
        backend: "real".to_string(),
        fake_access_ttl_secs: 300,
        fake_refresh_ttl_secs: 86_400,
    }
}

pub fn transport_for(server: &MockServer) -> Arc<dyn HttpTransport> {
    Arc::new(ReqwestHttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap())
}

/// A client talking to `server` with tokens kept in memory.
pub fn client_for(server: &MockServer) -> (Client, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let client = Client::from_parts(
        &real_auth(),
        store.clone() as Arc<dyn TokenStore>,
        transport_for(server),
    )
    .unwrap();
    (client, store)
}
