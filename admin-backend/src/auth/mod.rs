//! Bearer token verification
//!
//! A token resolves to the id of the profile it was issued for. Locally issued
//! sessions live in `auth_sessions`; when an external provider is configured the
//! token is checked against it instead.

mod remote;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::db::Database;

pub use remote::RemoteAuth;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("auth provider request failed: {0}")]
    Provider(#[from] reqwest::Error),
    #[error("auth provider answered with status {0}")]
    ProviderStatus(u16),
    #[error("invalid auth provider url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Profile id for a valid token, `None` for an unknown or expired one
    async fn verify(&self, token: &str) -> Result<Option<String>, AuthError>;

    /// End the session behind `token`; returns whether anything was revoked
    async fn revoke(&self, token: &str) -> Result<bool, AuthError>;

    fn name(&self) -> &'static str;
}

/// Sessions issued by this service and stored next to the business tables
pub struct LocalSessions {
    db: Arc<Database>,
}

impl LocalSessions {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenVerifier for LocalSessions {
    async fn verify(&self, token: &str) -> Result<Option<String>, AuthError> {
        Ok(self.db.validate_session(token)?.map(|s| s.profile_id))
    }

    async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.db.delete_session(token)?)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
