use duck_chat_model::{FunctionCall, ModelReply};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The content of a preset reply.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "function_call")]
    FunctionCall(FunctionCall),
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// The reply of this step.
    pub reply: PresetReply,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` that replies with plain text.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            reply: PresetReply::Text(text.into()),
            failures: None,
        }
    }

    /// Creates a `PresetResponse` that requests a function call.
    #[inline]
    pub fn function_call<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            reply: PresetReply::FunctionCall(FunctionCall::new(
                name,
                arguments.to_string(),
            )),
            failures: None,
        }
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    pub(crate) fn to_reply(&self) -> ModelReply {
        match &self.reply {
            PresetReply::Text(text) => ModelReply::text(text.clone()),
            PresetReply::FunctionCall(call) => ModelReply {
                content: None,
                function_call: Some(call.clone()),
            },
        }
    }
}
