//! JSON-RPC envelope normalization.
//!
//! Turns a raw HTTP response into an [`RpcReply`] according to the client's
//! error policy:
//!
//! | response                     | `re_raise = true`      | `re_raise = false`     |
//! |------------------------------|------------------------|------------------------|
//! | absent                       | `NoResponse`           | `NoResponse`           |
//! | not JSON                     | `Empty` (logged)       | `Empty` (logged)       |
//! | `{"error": {...}}`           | `Rpc(detail/message)`  | `Error(raw object)`    |
//! | `{"result": v}`              | `Result(v)`            | `Result(v)`            |
//! | neither                      | `Empty`                | `Empty`                |

use serde_json::Value;

use crate::error::ClientError;
use crate::request::{RequestBody, RpcOutcome, RpcReply};
use crate::transport::RawResponse;

#[derive(Debug, Clone, Copy)]
pub struct ResponseNormalizer {
    pub re_raise: bool,
    pub return_with_args: bool,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self {
            re_raise: true,
            return_with_args: false,
        }
    }
}

impl ResponseNormalizer {
    pub fn new(re_raise: bool, return_with_args: bool) -> Self {
        Self {
            re_raise,
            return_with_args,
        }
    }

    /// Normalize `response`. `return_with_args` overrides the default for
    /// this call when set.
    pub fn normalize(
        &self,
        response: Option<&RawResponse>,
        body: &RequestBody,
        return_with_args: Option<bool>,
    ) -> Result<RpcReply, ClientError> {
        let response = response.ok_or(ClientError::NoResponse)?;

        let outcome = match serde_json::from_slice::<Value>(&response.body) {
            Ok(json) => self.decode(json)?,
            Err(err) => {
                tracing::info!(
                    status = response.status,
                    request_body = %body,
                    error = %err,
                    "failed to load response"
                );
                RpcOutcome::Empty
            }
        };

        let mut reply = RpcReply::new(outcome);
        if return_with_args.unwrap_or(self.return_with_args) {
            reply.args = Some(body.clone());
        }
        Ok(reply)
    }

    fn decode(&self, mut json: Value) -> Result<RpcOutcome, ClientError> {
        if let Some(error) = json.get_mut("error").map(Value::take) {
            if self.re_raise {
                return Err(ClientError::Rpc(error_message(&error)));
            }
            return Ok(RpcOutcome::Error(error));
        }
        Ok(match json.get_mut("result").map(Value::take) {
            Some(result) => RpcOutcome::Result(result),
            None => RpcOutcome::Empty,
        })
    }
}

/// `detail` if present, else `message`, else the error rendered as JSON.
fn error_message(error: &Value) -> String {
    ["detail", "message"]
        .iter()
        .find_map(|key| error.get(*key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| error.to_string())
}
