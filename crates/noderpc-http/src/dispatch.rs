//! Concurrent fan-out of one method over many parameter sets.
//!
//! Each parameter set becomes an independent [`NodeClient::exec_with`] call
//! on its own task; a semaphore bounds how many run at once. Completions are
//! pushed onto a channel and handed to the caller as a [`Stream`], in
//! completion order.
//!
//! # Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use noderpc_core::{CallOptions, ClientConfig};
//! use noderpc_http::NodeClient;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), noderpc_core::ClientError> {
//! let client = Arc::new(NodeClient::new(ClientConfig::new(["https://eos.example/v1/chain"]))?);
//! let params = (1..=3).map(|n| json!({ "block_num_or_id": n }));
//! let mut blocks = client.dispatch_all("get_block", params, CallOptions::default(), Some(2));
//! while let Some(done) = blocks.next().await {
//!     println!("#{}: {:?}", done.index, done.result?.into_value());
//! }
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{FutureExt, Stream};
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};

use noderpc_core::error::ClientError;
use noderpc_core::request::{ensure_list, CallOptions, RequestBody, RpcReply};

use crate::client::NodeClient;

/// Upper bound for the default worker count.
const MAX_DEFAULT_WORKERS: usize = 32;

/// `min(32, cpus + 4)`.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .saturating_add(4)
        .min(MAX_DEFAULT_WORKERS)
}

/// The result of one dispatched call.
#[derive(Debug)]
pub struct Completion {
    /// Position of the parameter set in the input.
    pub index: usize,
    pub result: Result<RpcReply, ClientError>,
}

/// One-shot stream of completions; yields exactly one per parameter set.
///
/// Dropping it does not cancel calls already in flight.
#[derive(Debug)]
pub struct DispatchStream {
    rx: mpsc::UnboundedReceiver<Completion>,
    remaining: usize,
}

impl Stream for DispatchStream {
    type Item = Completion;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Completion>> {
        let this = self.get_mut();
        let polled = this.rx.poll_recv(cx);
        if let Poll::Ready(Some(_)) = polled {
            this.remaining = this.remaining.saturating_sub(1);
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl NodeClient {
    /// Run `method` once per element of `params`, at most `max_workers` at a
    /// time (else the configured `max_workers`, else [`default_workers`]).
    ///
    /// A scalar element is treated as a one-element argument list, so `"x"`
    /// and `["x"]` produce the same call. Must be called within a Tokio
    /// runtime.
    pub fn dispatch_all<I>(
        self: &Arc<Self>,
        method: &str,
        params: I,
        options: CallOptions,
        max_workers: Option<usize>,
    ) -> DispatchStream
    where
        I: IntoIterator<Item = Value>,
    {
        let workers = max_workers
            .or(self.config().max_workers)
            .unwrap_or_else(default_workers)
            .max(1);
        let permits = Arc::new(Semaphore::new(workers));
        let (tx, rx) = mpsc::unbounded_channel();

        let mut total = 0;
        for (index, param) in params.into_iter().enumerate() {
            total += 1;
            let body = RequestBody::from_args(ensure_list(param));
            let client = Arc::clone(self);
            let permits = Arc::clone(&permits);
            let tx = tx.clone();
            let method = method.to_string();
            let options = options.clone();

            tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => AssertUnwindSafe(client.exec_with(&method, body, options))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| Err(ClientError::Worker(panic_message(panic)))),
                    Err(e) => Err(ClientError::Worker(e.to_string())),
                };
                // Receiver gone: the caller stopped listening, drop the result.
                let _ = tx.send(Completion { index, result });
            });
        }

        tracing::debug!(method, total, workers, "dispatched");
        DispatchStream {
            rx,
            remaining: total,
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "call panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::StreamExt;
    use noderpc_core::config::ClientConfig;
    use noderpc_core::error::TransportError;
    use noderpc_core::request::RpcOutcome;
    use noderpc_core::transport::{HttpTransport, RawResponse};
    use reqwest::Url;
    use serde_json::json;

    /// Echoes the request body back as the result, after a short delay.
    #[derive(Default)]
    struct EchoTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        bodies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpTransport for EchoTransport {
        async fn post(&self, _url: &Url, body: &RequestBody) -> Result<RawResponse, TransportError> {
            self.bodies.lock().unwrap().push(body.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match body.as_str() {
                "boom" => Err(TransportError::Request("boom".into())),
                "panic" => panic!("transport exploded"),
                other => Ok(RawResponse::new(200, json!({ "result": other }).to_string())),
            }
        }
    }

    fn client() -> (Arc<NodeClient>, Arc<EchoTransport>) {
        let transport = Arc::new(EchoTransport::default());
        let config = ClientConfig::new(["https://a.example/v1/chain", "https://b.example/v1/chain"]);
        let client = NodeClient::with_transport(config, transport.clone()).unwrap();
        (Arc::new(client), transport)
    }

    #[tokio::test]
    async fn yields_one_completion_per_param() {
        let (client, _transport) = client();
        let params: Vec<Value> = (0..8).map(|n| json!(n.to_string())).collect();

        let stream = client.dispatch_all("get_block", params, CallOptions::default(), Some(3));
        assert_eq!(stream.size_hint(), (8, Some(8)));
        let done: Vec<Completion> = stream.collect().await;

        assert_eq!(done.len(), 8);
        let indices: BTreeSet<usize> = done.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..8).collect());
        for c in done {
            let reply = c.result.unwrap();
            assert_eq!(reply.outcome, RpcOutcome::Result(json!(c.index.to_string())));
        }
    }

    #[tokio::test]
    async fn worker_count_is_bounded() {
        let (client, transport) = client();
        let params: Vec<Value> = (0..6).map(|n| json!(n.to_string())).collect();

        let done: Vec<Completion> = client
            .dispatch_all("get_block", params, CallOptions::default(), Some(2))
            .collect()
            .await;

        assert_eq!(done.len(), 6);
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn scalar_and_list_params_are_equivalent() {
        let (client, transport) = client();
        let params = vec![json!("x"), json!(["x"]), json!({"block_num_or_id": 5})];

        let done: Vec<Completion> = client
            .dispatch_all("get_block", params, CallOptions::default(), None)
            .collect()
            .await;

        assert_eq!(done.len(), 3);
        let mut bodies = transport.bodies.lock().unwrap().clone();
        bodies.sort();
        assert_eq!(bodies, ["x", "x", r#"{"block_num_or_id":5}"#]);
    }

    #[tokio::test]
    async fn failure_stays_with_its_element() {
        let (client, _transport) = client();
        let params = vec![json!("a"), json!("boom"), json!("panic"), json!("b")];

        let mut done: Vec<Completion> = client
            .dispatch_all("get_block", params, CallOptions::default(), Some(4))
            .collect()
            .await;
        done.sort_by_key(|c| c.index);

        assert!(done[0].result.is_ok());
        assert!(matches!(done[1].result, Err(ClientError::Transport(_))));
        assert!(matches!(done[2].result, Err(ClientError::Worker(ref msg)) if msg == "transport exploded"));
        assert!(done[3].result.is_ok());
    }

    #[tokio::test]
    async fn empty_params_end_immediately() {
        let (client, _transport) = client();
        let done: Vec<Completion> = client
            .dispatch_all("get_block", Vec::new(), CallOptions::default(), None)
            .collect()
            .await;
        assert!(done.is_empty());
    }

    #[test]
    fn default_workers_is_capped() {
        let n = default_workers();
        assert!((5..=MAX_DEFAULT_WORKERS).contains(&n));
    }
}
