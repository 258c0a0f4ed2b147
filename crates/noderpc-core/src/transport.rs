//! The `HttpTransport` trait — the pooled HTTP capability the client calls into.

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;
use crate::request::RequestBody;

/// HTTP statuses treated as a normal answer (200 plus the redirect family).
pub const OK_STATUSES: &[u16] = &[200, 301, 302, 303, 307, 308];

/// A raw HTTP response, before JSON-RPC decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 200 and redirect statuses.
    pub fn is_ok_status(&self) -> bool {
        OK_STATUSES.contains(&self.status)
    }
}

/// Sends one JSON POST and returns whatever the node answered.
///
/// Non-2xx statuses are *not* errors at this layer; only failures to obtain
/// a response are.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one transport is shared by every
/// call of a client, including concurrently dispatched ones.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn post(&self, url: &Url, body: &RequestBody) -> Result<RawResponse, TransportError>;
}
