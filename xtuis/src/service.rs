use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use pin_project_lite::pin_project;
use tower::Service;
use tracing::warn;
use xtuis_limit::LimiterSet;

use crate::error::Error;

#[derive(Clone, Debug)]
struct RateLimitServiceMetrics {
    rate_limited: Counter<u64>,
}

/// Checks every quota window before handing a request to the inner service.
///
/// A denial fails the call with [`Error::RateLimited`] and the inner service
/// never sees the request. Clones share the same limiters.
#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    inner: S,
    limits: Arc<LimiterSet>,
    instruments: RateLimitServiceMetrics,
}

pin_project! {
    /// Either the inner service's future or an immediate rejection.
    #[project = ResponseFutureProj]
    pub enum ResponseFuture<F> {
        Rejected {
            error: Option<Error>,
        },
        Inner {
            #[pin]
            inner: F,
        },
    }
}

impl<F, T> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, Error>>,
{
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ResponseFutureProj::Inner { inner } => inner.poll(cx),
            ResponseFutureProj::Rejected { error } => {
                let error = error.take().expect("polled after completion");
                Poll::Ready(Err(error))
            }
        }
    }
}

impl<S, Req> Service<Req> for RateLimitService<S>
where
    S: Service<Req, Error = Error>,
{
    type Response = S::Response;
    type Error = Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Quota is only consumed in `call`, once a request actually exists.
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        match self.limits.check() {
            ControlFlow::Continue(()) => ResponseFuture::Inner {
                inner: self.inner.call(req),
            },
            ControlFlow::Break(window) => {
                warn!(window, "send rejected by local rate limit");
                self.instruments
                    .rate_limited
                    .add(1, &[KeyValue::new("window", window.to_string())]);
                ResponseFuture::Rejected {
                    error: Some(Error::RateLimited {
                        window: window.to_string(),
                    }),
                }
            }
        }
    }
}

impl<S> RateLimitService<S> {
    pub fn new(inner: S, limits: Arc<LimiterSet>) -> Self {
        let meter = global::meter("xtuis");
        let instruments = RateLimitServiceMetrics {
            rate_limited: meter.u64_counter("rate_limited").build(),
        };

        Self {
            inner,
            limits,
            instruments,
        }
    }

    pub fn limits(&self) -> &Arc<LimiterSet> {
        &self.limits
    }
}
