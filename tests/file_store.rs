use std::fs;
use taskdeck::client::Client;
use taskdeck::application_port::LoginInput;
use taskdeck::domain_model::*;
use taskdeck::domain_port::TokenStore;
use taskdeck::infra_file::FileTokenStore;
use taskdeck::settings::{Api, Auth, Log, Settings, Storage};

#[test]
fn partial_set_keeps_the_other_token() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::open(dir.path().join("tokens.json")).unwrap();

    store
        .set(Some(AccessToken::new("A1")), Some(RefreshToken::new("R1")))
        .unwrap();
    store.set(Some(AccessToken::new("A2")), None).unwrap();

    assert_eq!(store.get_access(), Some(AccessToken::new("A2")));
    assert_eq!(store.get_refresh(), Some(RefreshToken::new("R1")));
}

#[test]
fn tokens_survive_reopening_under_fixed_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    FileTokenStore::open(&path)
        .unwrap()
        .set(Some(AccessToken::new("A1")), Some(RefreshToken::new("R1")))
        .unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({ "stm_access": "A1", "stm_refresh": "R1" }));

    let reopened = FileTokenStore::open(&path).unwrap();
    assert_eq!(reopened.get_access(), Some(AccessToken::new("A1")));
    assert_eq!(reopened.get_refresh(), Some(RefreshToken::new("R1")));
}

#[test]
fn clear_removes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    let store = FileTokenStore::open(&path).unwrap();
    store.set(Some(AccessToken::new("A1")), None).unwrap();

    store.clear().unwrap();
    assert!(!path.exists());
    assert_eq!(store.get_access(), None);
    store.clear().unwrap();
}

fn settings_with(path: std::path::PathBuf) -> Settings {
    Settings {
        api: Api {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        },
        auth: Auth {
            backend: "fake".to_string(),
            fake_access_ttl_secs: 600,
            fake_refresh_ttl_secs: 3600,
        },
        log: Log {
            filter: "info".to_string(),
        },
        storage: Storage {
            backend: "file".to_string(),
            path,
        },
    }
}

#[tokio::test]
async fn session_persists_across_clients() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_with(dir.path().join("state/tokens.json"));

    let first = Client::try_new(&settings).unwrap();
    assert!(!first.session.init_from_storage());
    first
        .auth_gateway
        .login(LoginInput {
            username: "ada".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();

    let second = Client::try_new(&settings).unwrap();
    assert!(second.session.init_from_storage());
    assert!(second.session.claims().is_some_and(|c| !c.is_admin()));

    second.auth_gateway.logout();
    let third = Client::try_new(&settings).unwrap();
    assert!(!third.session.init_from_storage());
}

#[test]
fn truncated_token_file_reads_as_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    fs::write(&path, r#"{"stm_access": "eyJ"#).unwrap();

    let client = Client::try_new(&settings_with(path.clone())).unwrap();
    assert!(!client.session.init_from_storage());
    assert!(!path.exists());
}

#[test]
fn fake_auth_requires_a_loopback_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_with(dir.path().join("tokens.json"));
    settings.api.base_url = "https://tasks.example.com".to_string();
    assert!(Client::try_new(&settings).is_err());

    settings.auth.backend = "real".to_string();
    assert!(Client::try_new(&settings).is_ok());

    settings.auth.backend = "fake".to_string();
    settings.api.base_url = "http://localhost:8000".to_string();
    assert!(Client::try_new(&settings).is_ok());
}

#[test]
fn unknown_backends_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_with(dir.path().join("tokens.json"));
    settings.storage.backend = "sqlite".to_string();
    assert!(Client::try_new(&settings).is_err());

    settings.storage.backend = "memory".to_string();
    settings.auth.backend = "oauth".to_string();
    assert!(Client::try_new(&settings).is_err());
}
