/// file: src/auth.rs
/// description: read-only bearer credential sources for the stream and api clients
use parking_lot::RwLock;
use std::sync::Arc;

/// Synchronous read of the current bearer token, `None` when logged out.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token held in memory and swapped by the session owner on login/logout.
#[derive(Debug, Clone, Default)]
pub struct SessionToken {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionToken {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token.filter(|t| !t.trim().is_empty()))),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl CredentialSource for SessionToken {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

/// Reads the token from an environment variable on every connect.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}
