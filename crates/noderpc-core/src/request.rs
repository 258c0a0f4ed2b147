//! Request and reply types.

use serde::Serialize;
use serde_json::Value;

/// A request body, already serialized to its wire form.
///
/// Node APIs in the EOS family take a JSON object (or nothing) as the POST
/// body, and callers frequently hold it pre-serialized, so strings are used
/// verbatim rather than re-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBody(String);

impl RequestBody {
    /// An empty body.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Serialize any value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Self)
    }

    /// Build a body from a normalized argument list.
    ///
    /// One argument becomes the body itself, several become a JSON array,
    /// none becomes an empty body.
    pub fn from_args(mut args: Vec<Value>) -> Self {
        match args.len() {
            0 => Self::empty(),
            1 => Self::from(args.remove(0)),
            _ => Self(Value::Array(args).to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self(s),
            Value::Null => Self::empty(),
            other => Self(other.to_string()),
        }
    }
}

impl std::fmt::Display for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap a scalar parameter into a one-element argument list; arrays pass
/// through unchanged.
pub fn ensure_list(param: Value) -> Vec<Value> {
    match param {
        Value::Array(items) => items,
        scalar => vec![scalar],
    }
}

/// Whether a call may be replayed against another node after a transient
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Failover {
    /// Rotate to the next node and retry.
    #[default]
    Enabled,
    /// Surface the transient error as-is. Use for broadcasts and other
    /// writes, where a replay could duplicate the effect.
    Disabled,
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Target API namespace, e.g. `"chain_api"` or `"network_broadcast_api"`.
    pub api: Option<String>,
    /// Overrides the client's `return_with_args` default for this call.
    pub return_with_args: Option<bool>,
    pub failover: Failover,
}

impl CallOptions {
    pub fn api(api: impl Into<String>) -> Self {
        Self {
            api: Some(api.into()),
            ..Default::default()
        }
    }

    /// Options for a call that must never be replayed on another node.
    pub fn no_failover() -> Self {
        Self {
            failover: Failover::Disabled,
            ..Default::default()
        }
    }

    pub fn with_args(mut self, return_with_args: bool) -> Self {
        self.return_with_args = Some(return_with_args);
        self
    }
}

/// The decoded outcome of one call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// The `result` field of a success envelope.
    Result(Value),
    /// The raw `error` object, returned only when re-raise is disabled.
    Error(Value),
    /// No usable payload (no `result` field, or an unparsable body).
    Empty,
}

/// A normalized reply, optionally paired with the request body that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub outcome: RpcOutcome,
    pub args: Option<RequestBody>,
}

impl RpcReply {
    pub fn new(outcome: RpcOutcome) -> Self {
        Self { outcome, args: None }
    }

    /// The payload, whichever kind it is.
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            RpcOutcome::Result(v) | RpcOutcome::Error(v) => Some(v),
            RpcOutcome::Empty => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self.outcome {
            RpcOutcome::Result(v) | RpcOutcome::Error(v) => Some(v),
            RpcOutcome::Empty => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, RpcOutcome::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_values_are_used_verbatim() {
        let body = RequestBody::from(json!(r#"{"block_num_or_id":5}"#));
        assert_eq!(body.as_str(), r#"{"block_num_or_id":5}"#);
    }

    #[test]
    fn object_values_are_encoded() {
        let body = RequestBody::from(json!({"account_name": "eosio"}));
        assert_eq!(body.as_str(), r#"{"account_name":"eosio"}"#);
    }

    #[test]
    fn scalar_is_wrapped() {
        assert_eq!(ensure_list(json!("x")), vec![json!("x")]);
        assert_eq!(ensure_list(json!(["x"])), vec![json!("x")]);
        assert_eq!(ensure_list(json!(7)), vec![json!(7)]);
    }

    #[test]
    fn scalar_and_singleton_list_build_the_same_body() {
        let a = RequestBody::from_args(ensure_list(json!("x")));
        let b = RequestBody::from_args(ensure_list(json!(["x"])));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "x");
    }

    #[test]
    fn multiple_args_become_array() {
        let body = RequestBody::from_args(vec![json!(1), json!("a")]);
        assert_eq!(body.as_str(), r#"[1,"a"]"#);
        assert!(RequestBody::from_args(vec![]).is_empty());
    }

    #[test]
    fn reply_value_accessors() {
        let ok = RpcReply::new(RpcOutcome::Result(json!(42)));
        assert_eq!(ok.value(), Some(&json!(42)));
        assert!(!ok.is_error());

        let err = RpcReply::new(RpcOutcome::Error(json!({"message": "m"})));
        assert!(err.is_error());
        assert_eq!(RpcReply::new(RpcOutcome::Empty).into_value(), None);
    }

    #[test]
    fn no_failover_options() {
        let opts = CallOptions::no_failover().with_args(true);
        assert_eq!(opts.failover, Failover::Disabled);
        assert_eq!(opts.return_with_args, Some(true));
        assert_eq!(CallOptions::api("chain_api").failover, Failover::Enabled);
    }
}
