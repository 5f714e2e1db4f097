use std::sync::Arc;

use tower::Layer;
use xtuis_limit::LimiterSet;

use crate::service::RateLimitService;

/// Applies the quota windows of a [`LimiterSet`] to requests.
#[derive(Debug, Clone)]
pub struct RateLimitLayer {
    limits: Arc<LimiterSet>,
}

impl RateLimitLayer {
    /// Create a RateLimitLayer
    pub fn new(limits: Arc<LimiterSet>) -> Self {
        RateLimitLayer { limits }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService::new(service, self.limits.clone())
    }
}
