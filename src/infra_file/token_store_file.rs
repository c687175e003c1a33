//! Token persistence in a small JSON file.
//!
//! Every write goes to a sibling temp file with restricted permissions (0600
//! on unix) which is then renamed over the target. Token values are never
//! logged.

use crate::domain_model::*;
use crate::domain_port::*;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: Mutex<StoredTokens>,
}

impl FileTokenStore {
    /// Opens the store at `path`. A missing file reads as an empty store, and
    /// so does an unreadable one, which is removed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tokens = match load(&path) {
            Ok(tokens) => tokens,
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "token file is corrupt; starting logged out");
                discard(&path);
                StoredTokens::default()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(
            path = %path.display(),
            has_access = tokens.access.is_some(),
            has_refresh = tokens.refresh.is_some(),
            "token store opened"
        );
        Ok(Self {
            path,
            cache: Mutex::new(tokens),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoredTokens> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for FileTokenStore {
    fn get_access(&self) -> Option<AccessToken> {
        self.lock().access.clone()
    }

    fn get_refresh(&self) -> Option<RefreshToken> {
        self.lock().refresh.clone()
    }

    fn set(
        &self,
        access: Option<AccessToken>,
        refresh: Option<RefreshToken>,
    ) -> Result<(), StoreError> {
        let mut cache = self.lock();
        let mut next = cache.clone();
        next.apply(access, refresh);
        save(&self.path, &next)?;
        *cache = next;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut cache = self.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        }
        *cache = StoredTokens::default();
        Ok(())
    }
}

fn load(path: &Path) -> Result<StoredTokens, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoredTokens::default()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove token file"),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn save(path: &Path, tokens: &StoredTokens) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let contents = serde_json::to_string_pretty(tokens).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = temp_path(path);
    discard(&tmp);
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let written = options.open(&tmp).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    });
    if let Err(source) = written.and_then(|()| fs::rename(&tmp, path)) {
        discard(&tmp);
        return Err(io_err(source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_file_opens_empty_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, r#"{"stm_access": "eyJ"#).unwrap();

        let store = FileTokenStore::open(&path).unwrap();
        assert_eq!(store.get_access(), None);
        assert_eq!(store.get_refresh(), None);
        assert!(!path.exists());

        store.set(Some(AccessToken::new("A1")), None).unwrap();
        assert_eq!(
            FileTokenStore::open(&path).unwrap().get_access(),
            Some(AccessToken::new("A1"))
        );
    }

    #[test]
    fn writes_leave_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(temp_path(&path), "stale").unwrap();

        let store = FileTokenStore::open(&path).unwrap();
        store.set(Some(AccessToken::new("A1")), None).unwrap();
        store.set(Some(AccessToken::new("A2")), None).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("tokens.json")]);
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/tokens.json");
        let store = FileTokenStore::open(&path).unwrap();
        store.set(Some(AccessToken::new("A1")), None).unwrap();
        assert!(path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileTokenStore::open(&path).unwrap();
        store.set(None, Some(RefreshToken::new("R1"))).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn loose_permissions_are_tightened_on_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, r#"{"stm_refresh": "R1"}"#).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::open(&path).unwrap();
        store.set(Some(AccessToken::new("A1")), None).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get_refresh(), Some(RefreshToken::new("R1")));
    }
}
