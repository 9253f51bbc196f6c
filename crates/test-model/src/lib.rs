//! A local fake model for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use duck_chat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelReply, ModelRequest,
    Role,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct State {
    attempts: HashMap<usize, u64>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The step is selected by the
/// number of assistant messages in the request history, so the first request
/// of a conversation gets the first step, the request after one assistant
/// reply gets the second, and so on. If there are no enough steps in the
/// script, an error will be returned.
///
/// Clones share the recorded requests and failure counters, keep one around
/// to inspect what the session sent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<PresetResponse>,
    delay: Option<Duration>,
    state: Arc<Mutex<State>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script.push(preset);
    }

    /// Makes every reply wait for `duration` first.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, including failed attempts.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock_state().requests.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, req: &ModelRequest) -> Result<ModelReply, Error> {
        let step_idx = req
            .messages
            .iter()
            .filter(|msg| msg.role == Role::Assistant)
            .count();

        let mut state = self.lock_state();
        state.requests.push(req.clone());

        let Some(step) = self.conversation_script.get(step_idx) else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            });
        };

        let attempts = state.attempts.entry(step_idx).or_default();
        *attempts += 1;
        let should_fail = match step.failures {
            Some(0) => true,
            Some(failures) => *attempts <= failures,
            None => false,
        };
        if should_fail {
            return Err(Error {
                message: "injected failure",
                kind: ErrorKind::RateLimitExceeded,
            });
        }

        Ok(step.to_reply())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send + 'static
    {
        let result = self.respond(req);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            result
        }
    }
}
