use duck_chat_model::{
    ErrorKind, FunctionDescriptor, Message as ModelMessage, ModelReply,
    ModelRequest, Role,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, OpenAIConfig};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletion {
    pub id: Option<String>,
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub function_call: Option<FunctionCall>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Function {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionName {
    name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        function_call: Option<FunctionCall>,
    },
    Function {
        name: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    functions: Vec<Function>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionName>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        functions: req.functions.iter().map(create_function).collect(),
        function_call: req
            .function_call
            .as_ref()
            .map(|name| FunctionName { name: name.clone() }),
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    let content = msg.content.clone().unwrap_or_default();
    match msg.role {
        Role::System => Message::System { content },
        Role::User => Message::User { content },
        Role::Assistant => Message::Assistant {
            content: msg.content.clone(),
            function_call: msg.function_call.as_ref().map(|call| {
                FunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                }
            }),
        },
        Role::Function => Message::Function {
            name: msg.name.clone().unwrap_or_default(),
            content,
        },
    }
}

#[inline]
fn create_function(function: &FunctionDescriptor) -> Function {
    Function {
        name: function.name.clone(),
        description: function.description.clone(),
        parameters: function.parameters.clone(),
    }
}

/// Extracts the reply from the first choice of a completion.
pub fn parse_reply(mut completion: ChatCompletion) -> Result<ModelReply, Error> {
    if completion.choices.is_empty() {
        return Err(Error::new("no choices in the completion", ErrorKind::Other));
    }
    let choice = completion.choices.swap_remove(0);
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(Error::new(
            "the reply was filtered by the provider",
            ErrorKind::Moderated,
        ));
    }

    let ResponseMessage {
        content,
        function_call,
    } = choice.message;
    Ok(ModelReply {
        content,
        function_call: function_call.map(|call| {
            duck_chat_model::FunctionCall::new(call.name, call.arguments)
        }),
    })
}
