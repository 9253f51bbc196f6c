//! Core logic including the conversation loop, function dispatch, retries
//! and transcript persistence.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod error;
pub mod function;
mod model_client;
mod session;
pub mod transcript;

pub use error::Error;
pub use model_client::RetryPolicy;
pub use session::{
    DEFAULT_MAX_FUNCTION_CALLS, FALLBACK_REPLY, Session, SessionBuilder,
    TurnOutcome,
};

/// Re-exports of [`duck_chat_model`] crate.
pub mod model {
    pub use duck_chat_model::*;
}
