//! Failover JSON-RPC client.
//!
//! Every call is POSTed to the current node. Transient failures rotate to
//! the next node and retry, with linear back-off once a few attempts have
//! failed and a hard ceiling after which the error is surfaced. Calls that
//! must not be replayed (broadcasts) opt out of failover and get the raw
//! transient error instead.

use std::sync::Arc;

use noderpc_core::config::ClientConfig;
use noderpc_core::error::{ClientError, TransportError};
use noderpc_core::normalize::ResponseNormalizer;
use noderpc_core::policy::{RetryContext, RetryDecision, RetryPolicy};
use noderpc_core::request::{CallOptions, Failover, RequestBody, RpcReply};
use noderpc_core::rotator::{Node, NodeRotator};
use noderpc_core::transport::{HttpTransport, RawResponse};

use crate::transport::ReqwestTransport;

/// JSON-RPC client over a rotating set of equivalent nodes.
pub struct NodeClient {
    config: ClientConfig,
    rotator: NodeRotator,
    transport: Arc<dyn HttpTransport>,
    normalizer: ResponseNormalizer,
    retry: RetryPolicy,
}

impl NodeClient {
    /// Create a client using the pooled `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.transport).map_err(ClientError::Transport)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let rotator = NodeRotator::new(&config.nodes)?;
        Ok(Self {
            normalizer: ResponseNormalizer::new(config.re_raise, config.return_with_args),
            retry: RetryPolicy::new(config.retry.clone()),
            rotator,
            transport,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Switch to the next node.
    pub fn advance(&self) {
        self.rotator.advance();
    }

    /// Make `url` the current node.
    pub fn set_current(&self, url: &str) -> Result<(), ClientError> {
        self.rotator.set_current(url)
    }

    pub fn current_hostname(&self) -> Option<String> {
        self.rotator.current_hostname()
    }

    pub fn current_url(&self) -> String {
        self.rotator.current().url().to_string()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.rotator.nodes()
    }

    /// Execute `method` with default options.
    pub async fn exec(
        &self,
        method: &str,
        body: impl Into<RequestBody>,
    ) -> Result<RpcReply, ClientError> {
        self.exec_with(method, body, CallOptions::default()).await
    }

    /// Execute `method` against the current node, failing over on transient
    /// errors unless `options` (or the API namespace) forbids it.
    pub async fn exec_with(
        &self,
        method: &str,
        body: impl Into<RequestBody>,
        options: CallOptions,
    ) -> Result<RpcReply, ClientError> {
        let body = body.into();
        let failover = options.failover == Failover::Enabled
            && self.config.allows_failover(options.api.as_deref());

        let mut ctx = RetryContext::new();
        let response = loop {
            let node = self.rotator.current();
            match self.send(&node, method, &body).await {
                Ok(resp) => {
                    if !resp.is_ok_status() {
                        tracing::warn!(status = resp.status, url = %node.url(), method, "non 200 response");
                    }
                    break Some(resp);
                }
                Err(e) if e.is_transient() => {
                    if !failover {
                        tracing::warn!(error = %e, url = %node.url(), method, "failover disabled, not retrying");
                        return Err(ClientError::Transient(e));
                    }
                    self.rotator.advance();
                    let attempt = ctx.record_failure();
                    let hostname = self.current_hostname().unwrap_or_default();
                    tracing::debug!(attempt, error = %e, hostname = %hostname, "switched node");
                    match self.retry.decide(attempt) {
                        RetryDecision::Retry => {}
                        RetryDecision::Backoff(delay) => {
                            tracing::warn!(
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                method,
                                "backing off before retry"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::GiveUp => {
                            tracing::error!(attempt, error = %e, method, "max retries exceeded");
                            return Err(ClientError::Transient(e));
                        }
                    }
                }
                Err(e) => {
                    if self.config.re_raise {
                        return Err(ClientError::Transport(e));
                    }
                    tracing::info!(error = %e, url = %node.url(), method, "request error");
                    break None;
                }
            }
        };

        self.normalizer
            .normalize(response.as_ref(), &body, options.return_with_args)
    }

    async fn send(
        &self,
        node: &Node,
        method: &str,
        body: &RequestBody,
    ) -> Result<RawResponse, TransportError> {
        let url = node.endpoint(method)?;
        self.transport.post(&url, body).await
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("current", &self.current_url())
            .field("nodes", &self.rotator.len())
            .finish()
    }
}
