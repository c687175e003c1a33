use crate::domain_model::AccessToken;
use std::sync::RwLock;

/// The access token attached to outbound protected requests.
#[derive(Debug, Default)]
pub struct ActiveCredential {
    current: RwLock<Option<AccessToken>>,
}

impl ActiveCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self, token: AccessToken) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    pub fn deactivate(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn current(&self) -> Option<AccessToken> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
