use std::sync::Arc;

use duck_chat_model::{FunctionCall, Message, ModelReply};
use serde::Deserialize;
use serde_json::Value;
use tracing::Instrument;

use super::{FALLBACK_REPLY, Session, TurnOutcome};
use crate::error::Error;
use crate::function::{self, Dispatch, EXIT_CONVERSATION};

enum TurnState {
    AwaitingReply,
    ResolvingFunctionCall(FunctionCall),
    Terminal(String),
}

/// A reply after interpretation.
#[derive(Debug, PartialEq)]
enum Interpretation {
    Text(String),
    FunctionCall {
        message: Message,
        call: FunctionCall,
    },
}

/// Some models write the call into the content instead of using the
/// structured field.
#[derive(Deserialize)]
struct EmbeddedReply {
    function_call: EmbeddedFunctionCall,
}

#[derive(Deserialize)]
struct EmbeddedFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn interpret(reply: ModelReply) -> Interpretation {
    if let Some(call) = reply.function_call.clone() {
        return Interpretation::FunctionCall {
            message: reply.into_message(),
            call,
        };
    }

    let content = reply.content.unwrap_or_default();
    match serde_json::from_str::<EmbeddedReply>(content.trim()) {
        Ok(EmbeddedReply { function_call }) => {
            let arguments = match function_call.arguments {
                Value::String(arguments) => arguments,
                Value::Null => String::new(),
                arguments => arguments.to_string(),
            };
            debug!("found a function call in the content");
            Interpretation::FunctionCall {
                message: Message::assistant(content),
                call: FunctionCall::new(function_call.name, arguments),
            }
        }
        Err(_) => Interpretation::Text(content),
    }
}

impl Session {
    /// Sends a user message and runs the turn to completion.
    ///
    /// The model may call functions along the way, their results are added
    /// to the history and the model is asked again, up to the configured
    /// limit of calls per turn. Past the limit the turn ends with
    /// [`FALLBACK_REPLY`].
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownFunction`] if the model calls a function
    /// that is not registered, and with [`Error::SessionEnded`] if the
    /// session has already ended.
    pub async fn send_user_message<S: Into<String>>(
        &mut self,
        text: S,
    ) -> Result<TurnOutcome, Error> {
        if self.ended {
            return Err(Error::SessionEnded);
        }
        self.conversation.push(Message::user(text));

        // Held locally so that dispatching doesn't borrow `self`.
        let registry = Arc::clone(&self.registry);
        let mut calls = 0;
        let mut state = TurnState::AwaitingReply;
        loop {
            state = match state {
                TurnState::AwaitingReply => {
                    let reply = self
                        .request_completion(None)
                        .instrument(debug_span!("completion", calls))
                        .await;
                    match interpret(reply) {
                        Interpretation::Text(text) => {
                            self.conversation.push(Message::assistant(&*text));
                            TurnState::Terminal(text)
                        }
                        Interpretation::FunctionCall { call, .. }
                            if call.name != EXIT_CONVERSATION
                                && calls >= self.max_function_calls =>
                        {
                            warn!(
                                "function call limit ({}) reached, \
                                 dropping call to `{}`",
                                self.max_function_calls, call.name
                            );
                            self.conversation
                                .push(Message::assistant(FALLBACK_REPLY));
                            TurnState::Terminal(FALLBACK_REPLY.to_owned())
                        }
                        Interpretation::FunctionCall { message, call } => {
                            self.conversation.push(message);
                            TurnState::ResolvingFunctionCall(call)
                        }
                    }
                }
                TurnState::ResolvingFunctionCall(call) => {
                    match registry.dispatch(&call.name) {
                        None => {
                            error!("model called unknown function `{}`", call.name);
                            return Err(Error::UnknownFunction(call.name));
                        }
                        Some(Dispatch::Exit) => {
                            info!("model ended the conversation");
                            let path = self.end()?;
                            return Ok(TurnOutcome::Ended(path));
                        }
                        Some(Dispatch::Call(target)) => {
                            calls += 1;
                            if let Some(on_function_call) = &self.on_function_call
                            {
                                on_function_call(&call);
                            }
                            let span =
                                info_span!("function", name = %call.name);
                            let content = match function::call(target, &call)
                                .instrument(span)
                                .await
                            {
                                Ok(content) => content,
                                Err(err) => {
                                    warn!("function `{}` failed: {err}", call.name);
                                    err.to_string()
                                }
                            };
                            self.conversation
                                .push(Message::function(call.name, content));
                            TurnState::AwaitingReply
                        }
                    }
                }
                TurnState::Terminal(text) => {
                    return Ok(TurnOutcome::Reply(text));
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_interpret_text() {
        assert_eq!(
            interpret(ModelReply::text("Hello!")),
            Interpretation::Text("Hello!".to_owned())
        );
        assert_eq!(
            interpret(ModelReply::default()),
            Interpretation::Text(String::new())
        );
        // JSON of another shape is just text.
        assert_eq!(
            interpret(ModelReply::text(r#"{"answer": 42}"#)),
            Interpretation::Text(r#"{"answer": 42}"#.to_owned())
        );
    }

    #[test]
    fn test_interpret_structured_call() {
        let call = FunctionCall::new("search_text", r#"{"query":"rust"}"#);
        let reply = ModelReply {
            content: None,
            function_call: Some(call.clone()),
        };
        assert_eq!(
            interpret(reply),
            Interpretation::FunctionCall {
                message: Message::assistant_function_call(None, call.clone()),
                call,
            }
        );
    }

    #[test]
    fn test_interpret_embedded_call() {
        let object = json!({
            "function_call": {
                "name": "search_news",
                "arguments": { "query": "rust" }
            }
        })
        .to_string();
        let Interpretation::FunctionCall { message, call } =
            interpret(ModelReply::text(&*object))
        else {
            panic!("expected a function call");
        };
        assert_eq!(message, Message::assistant(&*object));
        assert_eq!(call.name, "search_news");
        assert_eq!(call.decode_arguments().unwrap(), json!({ "query": "rust" }));

        let string = r#"{"function_call": {"name": "search_text", "arguments": "{\"query\": \"duck\"}"}}"#;
        let Interpretation::FunctionCall { call, .. } =
            interpret(ModelReply::text(string))
        else {
            panic!("expected a function call");
        };
        assert_eq!(call.arguments, r#"{"query": "duck"}"#);
    }
}
