//! Handshake transport.

use async_trait::async_trait;
use tracing::trace;
use url::Url;

use crate::error::LinkError;

/// What the auth endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    /// URL that produced the response, after redirects.
    pub url: Url,
    pub status: u16,
}

impl AuthResponse {
    pub fn is_authorized(&self) -> bool {
        self.status == 200
    }
}

/// Issues the handshake request.
///
/// Any completed response is `Ok`, whatever its status; `Err` means the
/// request never completed.
#[async_trait]
pub trait AuthProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<AuthResponse, LinkError>;
}

/// [`AuthProbe`] backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpAuthProbe {
    client: reqwest::Client,
}

impl HttpAuthProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, custom roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthProbe for HttpAuthProbe {
    async fn probe(&self, url: &Url) -> Result<AuthResponse, LinkError> {
        trace!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        Ok(AuthResponse {
            url: response.url().clone(),
            status: response.status().as_u16(),
        })
    }
}
