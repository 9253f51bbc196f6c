use crate::{FunctionDescriptor, Message};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The conversation history, oldest first.
    pub messages: Vec<Message>,
    /// Functions that are available to the model.
    pub functions: Vec<FunctionDescriptor>,
    /// If set, the model is instructed to call exactly this function.
    pub function_call: Option<String>,
}
