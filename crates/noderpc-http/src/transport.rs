//! Pooled HTTP transport backed by `reqwest`.
//!
//! Features:
//! - Connection pooling with TCP keepalive and rustls certificate validation
//! - Connection-level retries (the request never reached the node, so
//!   replaying it is safe)
//! - Optional blocking pool: callers wait for a free slot instead of opening
//!   extra connections

use std::error::Error as _;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use tokio::sync::Semaphore;

use noderpc_core::config::TransportConfig;
use noderpc_core::error::TransportError;
use noderpc_core::request::RequestBody;
use noderpc_core::transport::{HttpTransport, RawResponse};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// `HttpTransport` implementation over a shared `reqwest::Client`.
pub struct ReqwestTransport {
    http: reqwest::Client,
    retries: u32,
    timeout: Duration,
    slots: Option<Arc<Semaphore>>,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .pool_max_idle_per_host(config.max_size)
            .tcp_keepalive(config.tcp_keepalive.then_some(KEEPALIVE_INTERVAL))
            .redirect(reqwest::redirect::Policy::limited(config.retries as usize))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let slots = config
            .pool_block
            .then(|| Arc::new(Semaphore::new((config.num_pools * config.max_size).max(1))));

        Ok(Self {
            http,
            retries: config.retries,
            timeout,
            slots,
        })
    }

    async fn send_once(&self, url: &Url, body: &RequestBody) -> Result<RawResponse, reqwest::Error> {
        let resp = self
            .http
            .post(url.clone())
            .body(body.as_str().to_owned())
            .send()
            .await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;
        Ok(RawResponse::new(status, bytes.to_vec()))
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            return TransportError::Timeout {
                ms: self.timeout.as_millis() as u64,
            };
        }
        if err.is_builder() {
            return TransportError::Request(err.to_string());
        }
        if err.is_redirect() {
            return TransportError::MaxRetries {
                attempts: self.retries,
                last: err.to_string(),
            };
        }
        if is_connection_reset(&err) || err.is_connect() {
            return TransportError::ConnectionReset(err.to_string());
        }
        if err.is_request() || err.is_body() || err.is_decode() {
            return TransportError::Protocol(err.to_string());
        }
        TransportError::Request(err.to_string())
    }
}

/// Walks the source chain looking for an I/O error that means the peer went
/// away.
fn is_connection_reset(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            );
        }
        source = e.source();
    }
    false
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, url: &Url, body: &RequestBody) -> Result<RawResponse, TransportError> {
        let _permit = match &self.slots {
            Some(slots) => Some(
                slots
                    .acquire()
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?,
            ),
            None => None,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send_once(url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_connect() && attempt <= self.retries => {
                    tracing::trace!(attempt, error = %e, url = %url, "connect failed, retrying");
                }
                Err(e) if e.is_connect() => {
                    return Err(TransportError::MaxRetries {
                        attempts: attempt,
                        last: e.to_string(),
                    });
                }
                Err(e) => return Err(self.classify(e)),
            }
        }
    }
}
