//! noderpc-core — foundation types for noderpc.
//!
//! # Overview
//!
//! noderpc is a JSON-RPC client for a set of interchangeable blockchain
//! nodes that routes around failing nodes. The core crate defines:
//!
//! - [`HttpTransport`] — the pooled HTTP capability the client calls into
//! - [`NodeRotator`] — cyclic rotation over the configured nodes
//! - [`ResponseNormalizer`] — JSON-RPC envelope decoding and error policy
//! - [`ClientConfig`] — validated client settings
//! - [`TransportError`] / [`ClientError`] — structured error types
//! - [`policy`] module — failover retry and back-off

pub mod config;
pub mod error;
pub mod normalize;
pub mod policy;
pub mod request;
pub mod rotator;
pub mod transport;

pub use config::{ClientConfig, TransportConfig};
pub use error::{ClientError, TransportError};
pub use normalize::ResponseNormalizer;
pub use request::{ensure_list, CallOptions, Failover, RequestBody, RpcOutcome, RpcReply};
pub use rotator::{Node, NodeRotator};
pub use transport::{HttpTransport, RawResponse};
