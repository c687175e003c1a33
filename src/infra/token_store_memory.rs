use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: Option<AccessToken>, refresh: Option<RefreshToken>) -> Self {
        let mut tokens = StoredTokens::default();
        tokens.apply(access, refresh);
        Self {
            tokens: Mutex::new(tokens),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoredTokens> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
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
        self.lock().apply(access, refresh);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock() = StoredTokens::default();
        Ok(())
    }
}
