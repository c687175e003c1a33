use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub auth: Auth,
    pub log: Log,
    pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "real"
    #[serde(default = "default_fake_access_ttl")]
    pub fake_access_ttl_secs: u64,
    #[serde(default = "default_fake_refresh_ttl")]
    pub fake_refresh_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "file" or "memory"
    pub path: PathBuf,
}

fn default_fake_access_ttl() -> u64 {
    5 * 60
}

fn default_fake_refresh_ttl() -> u64 {
    24 * 60 * 60
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "TASKDECK";

/// Loads the settings file, then applies `TASKDECK_<SECTION>__<KEY>` overrides.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_file_with_fake_ttl_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[api]
base_url = "http://127.0.0.1:9000"
timeout_secs = 3

[auth]
backend = "fake"

[log]
filter = "debug"

[storage]
backend = "memory"
path = "tokens.json"
"#
        )
        .unwrap();

        let settings = parse_settings(file.path().to_str()).unwrap();
        assert_eq!(settings.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(settings.api.timeout_secs, 3);
        assert_eq!(settings.auth.fake_access_ttl_secs, 300);
        assert_eq!(settings.storage.path, PathBuf::from("tokens.json"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }
}
