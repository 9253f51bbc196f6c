//! Conversation-related types.

use duck_chat_model::Message;

/// The ordered message history of a session.
///
/// The first message is always the system prompt. Messages are only ever
/// appended, except by [`Conversation::reset`].
#[derive(Clone, Debug)]
pub struct Conversation {
    system_prompt: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates a conversation that only contains the system prompt.
    #[inline]
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        let system_prompt = system_prompt.into();
        let messages = vec![Message::system(system_prompt.clone())];
        Self {
            system_prompt,
            messages,
        }
    }

    /// Returns the system prompt.
    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns all messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages, including the system prompt.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// A conversation always holds the system prompt, so this is never true.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: Message) {
        trace!("appending {:?} message", msg.role);
        self.messages.push(msg);
    }

    /// Drops everything but the system prompt.
    pub(crate) fn reset(&mut self) {
        self.messages.truncate(1);
    }
}
