//! Transport- and client-level error types.

use thiserror::Error;

/// Errors raised by an [`HttpTransport`](crate::transport::HttpTransport) while
/// performing a single POST.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection refused, reset or aborted by the peer.
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    /// No response within the configured request timeout.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The peer violated HTTP (truncated body, malformed status line, ...).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The transport gave up after its own connection-level retries.
    #[error("max retries exceeded after {attempts} attempts: {last}")]
    MaxRetries { attempts: u32, last: String },

    /// The request itself could not be built or sent (not a node fault).
    #[error("request error: {0}")]
    Request(String),

    /// The endpoint URL could not be constructed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Returns `true` if the failure is attributable to the node or the
    /// network, so another node may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionReset(_)
                | Self::Timeout { .. }
                | Self::Protocol(_)
                | Self::MaxRetries { .. }
        )
    }
}

/// Errors surfaced to callers of the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A transient failure that was not (or could no longer be) retried.
    #[error("node failure: {0}")]
    Transient(TransportError),

    /// The node answered with a JSON-RPC `error` envelope.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// No response object was obtained at all.
    #[error("nodes have failed to respond, all retries exhausted")]
    NoResponse,

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Transport(TransportError),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A dispatched call panicked before producing a result.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl ClientError {
    /// Returns `true` for errors carrying a transient transport failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
