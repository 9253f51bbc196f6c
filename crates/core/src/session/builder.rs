use std::path::PathBuf;
use std::sync::Arc;

use duck_chat_model::{FunctionCall, ModelProvider};

use super::{
    DEFAULT_MAX_FUNCTION_CALLS, DEFAULT_SYSTEM_PROMPT, DEFAULT_TRANSCRIPT_DIR,
    FunctionCallCallback, Session,
};
use crate::conversation::Conversation;
use crate::function::Registry;
use crate::model_client::{ModelClient, RetryPolicy};

/// [`Session`] builder.
pub struct SessionBuilder {
    model_client: ModelClient,
    registry: Option<Arc<Registry>>,
    system_prompt: Option<String>,
    max_function_calls: usize,
    transcript_dir: Option<PathBuf>,
    on_function_call: Option<FunctionCallCallback>,
}

impl SessionBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: None,
            system_prompt: None,
            max_function_calls: DEFAULT_MAX_FUNCTION_CALLS,
            transcript_dir: None,
            on_function_call: None,
        }
    }

    /// Sets the functions available to the model.
    #[inline]
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the system prompt, the first message of the conversation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets how failed completion requests are retried.
    #[inline]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.model_client.set_retry_policy(retry_policy);
        self
    }

    /// Sets how many functions a single turn may call. Defaults to
    /// [`DEFAULT_MAX_FUNCTION_CALLS`].
    #[inline]
    pub fn with_max_function_calls(mut self, max: usize) -> Self {
        self.max_function_calls = max;
        self
    }

    /// Sets the directory where transcripts are saved. Defaults to
    /// `conversations` in the working directory.
    #[inline]
    pub fn with_transcript_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.transcript_dir = Some(dir.into());
        self
    }

    /// Attaches a callback to be invoked before a function is called.
    #[inline]
    pub fn on_function_call(
        mut self,
        on_function_call: impl Fn(&FunctionCall) + Send + Sync + 'static,
    ) -> Self {
        self.on_function_call = Some(Box::new(on_function_call));
        self
    }

    /// Builds the session.
    pub fn build(self) -> Session {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(Registry::builder().build()));
        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_owned());
        let transcript_dir = self
            .transcript_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSCRIPT_DIR));

        Session {
            model_client: self.model_client,
            registry,
            conversation: Conversation::new(system_prompt),
            max_function_calls: self.max_function_calls,
            transcript_dir,
            on_function_call: self.on_function_call,
            ended: false,
        }
    }
}
