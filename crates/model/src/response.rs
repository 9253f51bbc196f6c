use serde::{Deserialize, Serialize};

use crate::{FunctionCall, Message};

/// A complete reply from the model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelReply {
    /// The text content of the reply.
    pub content: Option<String>,
    /// The function call requested by the model, if any.
    pub function_call: Option<FunctionCall>,
}

impl ModelReply {
    /// Creates a text-only reply.
    #[inline]
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            function_call: None,
        }
    }

    /// Converts the reply into an assistant message for the history.
    #[inline]
    pub fn into_message(self) -> Message {
        match self.function_call {
            Some(function_call) => {
                Message::assistant_function_call(self.content, function_call)
            }
            None => Message::assistant(self.content.unwrap_or_default()),
        }
    }
}
