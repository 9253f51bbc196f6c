//! DuckChat, a chat agent that answers questions by searching DuckDuckGo.
//!
//! The crate assembles the search functions and the OpenAI provider into a
//! ready-to-use session, and ships a CLI for chatting in the terminal. The
//! pieces are also usable as a library to embed the agent in other hosts.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod functions;
pub mod input;

pub use functions::build_registry;

/// The system prompt of DuckChat sessions.
pub const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// Re-exports of [`duck_chat_core`] crate.
pub mod core {
    pub use duck_chat_core::*;
}
