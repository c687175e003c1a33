use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The persisted layout: two optional strings under fixed keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(rename = "stm_access", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessToken>,
    #[serde(rename = "stm_refresh", default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshToken>,
}

impl StoredTokens {
    pub fn apply(&mut self, access: Option<AccessToken>, refresh: Option<RefreshToken>) {
        if let Some(access) = access {
            self.access = Some(access);
        }
        if let Some(refresh) = refresh {
            self.refresh = Some(refresh);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token file {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted access/refresh token pair. Pure storage: nothing here inspects
/// token contents.
pub trait TokenStore: Send + Sync {
    fn get_access(&self) -> Option<AccessToken>;
    fn get_refresh(&self) -> Option<RefreshToken>;
    /// Overwrites each provided token; `None` leaves the stored value as is.
    fn set(
        &self,
        access: Option<AccessToken>,
        refresh: Option<RefreshToken>,
    ) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_omitted_fields() {
        let mut tokens = StoredTokens::default();
        tokens.apply(Some(AccessToken::new("A1")), Some(RefreshToken::new("R1")));
        tokens.apply(Some(AccessToken::new("A2")), None);
        assert_eq!(tokens.access, Some(AccessToken::new("A2")));
        assert_eq!(tokens.refresh, Some(RefreshToken::new("R1")));
    }

    #[test]
    fn serializes_under_fixed_keys() {
        let mut tokens = StoredTokens::default();
        tokens.apply(Some(AccessToken::new("A1")), None);
        let value = serde_json::to_value(&tokens).unwrap();
        assert_eq!(value, serde_json::json!({ "stm_access": "A1" }));
    }
}
