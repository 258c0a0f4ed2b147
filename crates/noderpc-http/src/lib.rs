//! noderpc-http — failover JSON-RPC client over HTTP.
//!
//! - [`NodeClient`] — executes calls against the current node, rotating and
//!   backing off on transient failures
//! - [`dispatch`] — concurrent fan-out of many calls over a bounded pool
//! - [`ReqwestTransport`] — pooled `reqwest` implementation of
//!   [`HttpTransport`](noderpc_core::HttpTransport)
//!
//! # Quick start
//! ```rust,no_run
//! use noderpc_core::ClientConfig;
//! use noderpc_http::NodeClient;
//!
//! # async fn run() -> Result<(), noderpc_core::ClientError> {
//! let client = NodeClient::new(ClientConfig::new([
//!     "https://eos-a.example/v1/chain",
//!     "https://eos-b.example/v1/chain",
//! ]))?;
//! let info = client.exec("get_info", "").await?;
//! println!("{:?}", info.into_value());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dispatch;
pub mod logging;
pub mod transport;

pub use client::NodeClient;
pub use dispatch::{Completion, DispatchStream};
pub use logging::{init_from_config, init_tracing};
pub use transport::ReqwestTransport;
