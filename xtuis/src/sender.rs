use std::sync::Arc;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderValue;
use tower::Service;
use tracing::debug;

use crate::error::Error;
use crate::payload::Payload;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Posts a [`Payload`] to the push endpoint.
///
/// This is the innermost service of a [`Client`](crate::Client); it performs
/// no quota checks of its own.
#[derive(Clone, Debug)]
pub struct HttpSender {
    http: reqwest::Client,
    endpoint: Arc<str>,
}

impl HttpSender {
    pub fn new(server_url: &str, token: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint(server_url, token).into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `{server_url}/{token}.send`, without doubling a trailing slash.
pub(crate) fn endpoint(server_url: &str, token: &str) -> String {
    format!("{}/{}.send", server_url.trim_end_matches('/'), token)
}

impl Service<Payload> for HttpSender {
    type Response = ();
    type Error = Error;
    type Future = BoxFuture<'static, Result<(), Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, payload: Payload) -> Self::Future {
        let http = self.http.clone();
        let request = self.http.post(&*self.endpoint).form(&payload).build();

        async move {
            let mut request = request?;
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

            let response = http.execute(request).await?;
            let status = response.status();
            debug!(%status, "push server responded");
            if status != StatusCode::OK {
                return Err(Error::Status(status));
            }
            Ok(())
        }
        .boxed()
    }
}
