use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The system instructions.
    System,
    /// A user input.
    User,
    /// A reply from the model.
    Assistant,
    /// The result of a function call.
    Function,
}

/// A message in the conversation history.
///
/// Use the constructors instead of building the struct directly, they keep
/// the `name` and `function_call` fields consistent with the role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// The author of this message.
    pub role: Role,
    /// The text content, `None` when only a function call is attached.
    pub content: Option<String>,
    /// The function call requested by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    /// The function that produced the content, only set for
    /// [`Role::Function`] messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::text(Role::System, content.into())
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::text(Role::User, content.into())
    }

    /// Creates an assistant message with text content.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::text(Role::Assistant, content.into())
    }

    /// Creates an assistant message that requests a function call.
    #[inline]
    pub fn assistant_function_call(
        content: Option<String>,
        function_call: FunctionCall,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content,
            function_call: Some(function_call),
            name: None,
        }
    }

    /// Creates a message carrying the result of the named function.
    #[inline]
    pub fn function<N: Into<String>, S: Into<String>>(
        name: N,
        content: S,
    ) -> Self {
        Self {
            role: Role::Function,
            content: Some(content.into()),
            function_call: None,
            name: Some(name.into()),
        }
    }

    #[inline]
    fn text(role: Role, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            function_call: None,
            name: None,
        }
    }
}

/// A function call requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The name of the function to call.
    pub name: String,
    /// The arguments in JSON text, as generated by the model.
    ///
    /// Models don't always produce valid JSON, so this is kept opaque until
    /// [`FunctionCall::decode_arguments`] is called.
    pub arguments: String,
}

impl FunctionCall {
    /// Creates a function call.
    #[inline]
    pub fn new<N: Into<String>, A: Into<String>>(name: N, arguments: A) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decodes the arguments as JSON.
    ///
    /// Blank or `null` arguments are treated as an empty object, which is
    /// what models usually send for functions without parameters.
    pub fn decode_arguments(&self) -> Result<Value, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        match serde_json::from_str(&self.arguments)? {
            Value::Null => Ok(Value::Object(Map::new())),
            value => Ok(value),
        }
    }
}

/// Describes a function that can be called by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Name of the function.
    pub name: String,
    /// Description of the function.
    pub description: String,
    /// Parameters definition of the function.
    ///
    /// For most model providers, the parameters should be defined by a
    /// [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_messages() {
        let msg = Message::assistant_function_call(
            None,
            FunctionCall::new("search_text", r#"{"query":"rust"}"#),
        );
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "assistant",
                "content": null,
                "function_call": {
                    "name": "search_text",
                    "arguments": "{\"query\":\"rust\"}"
                }
            })
        );

        let msg = Message::function("search_text", "[]");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "role": "function", "content": "[]", "name": "search_text" })
        );
    }

    #[test]
    fn test_decode_arguments() {
        let call = FunctionCall::new("exit_conversation", "  ");
        assert_eq!(call.decode_arguments().unwrap(), json!({}));

        let call = FunctionCall::new("exit_conversation", "null");
        assert_eq!(call.decode_arguments().unwrap(), json!({}));

        let call = FunctionCall::new("search_news", r#"{"query": "rust"}"#);
        assert_eq!(call.decode_arguments().unwrap(), json!({ "query": "rust" }));

        let call = FunctionCall::new("search_news", "{query: rust");
        assert!(call.decode_arguments().is_err());
    }
}
