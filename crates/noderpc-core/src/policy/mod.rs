//! Failover policy.
//!
//! ```text
//! transient failure → [advance node] → [RetryPolicy::decide] → retry | back off | give up
//! ```

pub mod retry;

pub use retry::{RetryConfig, RetryContext, RetryDecision, RetryPolicy};
