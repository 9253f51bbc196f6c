mod builder;
mod turn;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use duck_chat_model::{FunctionCall, Message, ModelReply, ModelRequest};

use crate::conversation::Conversation;
use crate::error::Error;
use crate::function::Registry;
use crate::model_client::ModelClient;
use crate::transcript;
pub use builder::SessionBuilder;

/// The default number of functions a single turn may call.
pub const DEFAULT_MAX_FUNCTION_CALLS: usize = 3;

/// The reply used when a turn runs out of function calls.
pub const FALLBACK_REPLY: &str =
    "I couldn't find an answer to that. Please try rephrasing your question.";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const DEFAULT_TRANSCRIPT_DIR: &str = "conversations";

type FunctionCallCallback = Box<dyn Fn(&FunctionCall) + Send + Sync>;

/// How a turn finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered with text.
    Reply(String),
    /// The model ended the conversation, the transcript was saved to the
    /// path.
    Ended(PathBuf),
}

/// A conversation with a model, which owns the message history and calls
/// functions on behalf of the model.
///
/// A session is driven one turn at a time with
/// [`Session::send_user_message`], and finished with [`Session::end`].
pub struct Session {
    model_client: ModelClient,
    registry: Arc<Registry>,
    conversation: Conversation,
    max_function_calls: usize,
    transcript_dir: PathBuf,
    on_function_call: Option<FunctionCallCallback>,
    ended: bool,
}

impl Session {
    /// Sends one request with the full history and all function
    /// descriptors.
    ///
    /// If `forced_function` is set, the model is instructed to call exactly
    /// that function. Failed requests are retried, and once all attempts
    /// fail the error text is returned as the content of the reply.
    pub async fn request_completion(
        &self,
        forced_function: Option<&str>,
    ) -> ModelReply {
        let req = ModelRequest {
            messages: self.conversation.messages().to_vec(),
            functions: self.registry.descriptors(),
            function_call: forced_function.map(ToOwned::to_owned),
        };
        match self.model_client.send_request(req).await {
            Ok(reply) => reply,
            Err(err) => ModelReply::text(err.to_string()),
        }
    }

    /// Returns the message history, starting with the system prompt.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Returns the conversation of this session.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the functions available to the model.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns whether the session has ended.
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Drops every message but the system prompt.
    #[deprecated(note = "start a new session instead")]
    pub fn clear_history(&mut self) {
        debug!("clearing {} messages", self.conversation.len() - 1);
        self.conversation.reset();
    }

    /// Ends the session and saves the transcript.
    ///
    /// Returns the path of the transcript file. Ending a session twice fails
    /// with [`Error::SessionEnded`].
    pub fn end(&mut self) -> Result<PathBuf, Error> {
        if self.ended {
            return Err(Error::SessionEnded);
        }
        let path =
            transcript::transcript_path(&self.transcript_dir, &Local::now());
        transcript::write_transcript(
            &path,
            &self.registry.descriptors(),
            self.conversation.messages(),
        )
        .map_err(Error::Transcript)?;

        self.ended = true;
        info!("session ended, transcript saved to {}", path.display());
        Ok(path)
    }
}
