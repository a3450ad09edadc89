use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{AuthError, TokenVerifier};

/// Hosted identity provider exposing `GET /auth/v1/user` for the bearer's user
pub struct RemoteAuth {
    client: reqwest::Client,
    user_url: Url,
    logout_url: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
}

impl RemoteAuth {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AuthError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("admin-backend/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            user_url: base.join("auth/v1/user")?,
            logout_url: base.join("auth/v1/logout")?,
            api_key,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        let builder = builder.bearer_auth(token);
        match &self.api_key {
            Some(key) => builder.header("apikey", key),
            None => builder,
        }
    }
}

/// Statuses the provider uses for a token it does not accept
fn is_rejection(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 401 | 403 | 404)
}

#[async_trait]
impl TokenVerifier for RemoteAuth {
    async fn verify(&self, token: &str) -> Result<Option<String>, AuthError> {
        let response = self
            .request(self.client.get(self.user_url.clone()), token)
            .send()
            .await?;

        let status = response.status();
        if is_rejection(status) {
            log::debug!("Auth provider rejected token with {}", status);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthError::ProviderStatus(status.as_u16()));
        }

        let user: ProviderUser = response.json().await?;
        Ok(Some(user.id))
    }

    async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        let response = self
            .request(self.client.post(self.logout_url.clone()), token)
            .send()
            .await?;

        let status = response.status();
        if is_rejection(status) {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(AuthError::ProviderStatus(status.as_u16()));
        }
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
