use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tower::ServiceBuilder;
use tower::ServiceExt;
use tower::util::BoxCloneSyncService;
use tracing::info;
use xtuis_limit::LimiterSet;

use crate::RateLimitLayer;
use crate::config::ClientConfig;
use crate::config::DEFAULT_SERVER_URL;
use crate::error::Result;
use crate::payload::Payload;
use crate::sender::HttpSender;

/// A push client for one xtuis token.
///
/// Every send passes the client's [`LimiterSet`] first, so exhausted quota is
/// reported as [`Error::RateLimited`](crate::Error::RateLimited) without a
/// request reaching the server.
#[derive(Clone)]
pub struct Client {
    service: BoxCloneSyncService<Payload, (), crate::Error>,
    limits: Arc<LimiterSet>,
    endpoint: String,
}

impl Client {
    /// A client for the default server with the service's default quotas.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    /// A client built from `config`, with fresh limiters for its windows.
    pub fn from_config(token: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Self::builder(token)
            .server_url(config.server_url.clone())
            .timeout(config.timeout())
            .limits(Arc::new(config.limiter_set()))
            .build()
    }

    /// Sends one message.
    ///
    /// An invalid payload is rejected before any quota is consumed.
    pub async fn send(&self, payload: &Payload) -> Result<()> {
        payload.validate()?;
        self.service.clone().oneshot(payload.clone()).await?;
        info!(text = payload.text(), "message sent");
        Ok(())
    }

    pub fn limits(&self) -> &Arc<LimiterSet> {
        &self.limits
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// Builds a [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    token: String,
    server_url: String,
    timeout: Duration,
    limits: Option<Arc<LimiterSet>>,
}

impl ClientBuilder {
    fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: Duration::from_secs(5),
            limits: None,
        }
    }

    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share a limiter set, e.g. between clients of the same token.
    ///
    /// Defaults to a fresh [`LimiterSet::default`].
    pub fn limits(mut self, limits: Arc<LimiterSet>) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn build(self) -> Result<Client> {
        let limits = self.limits.unwrap_or_default();
        let sender = HttpSender::new(&self.server_url, &self.token, self.timeout)?;
        let endpoint = sender.endpoint().to_string();

        let service = BoxCloneSyncService::new(
            ServiceBuilder::new()
                .layer(RateLimitLayer::new(limits.clone()))
                .service(sender),
        );

        Ok(Client {
            service,
            limits,
            endpoint,
        })
    }
}
