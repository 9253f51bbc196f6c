use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;

/// Errors that abort a turn or the session.
///
/// Completion and function failures never show up here, they are fed back
/// into the conversation as text instead.
#[derive(Debug)]
pub enum Error {
    /// The model asked for a function that is not registered.
    UnknownFunction(String),
    /// The session has already ended.
    SessionEnded,
    /// The transcript could not be written.
    Transcript(io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownFunction(name) => write!(f, "unknown function: {name}"),
            Error::SessionEnded => write!(f, "the session has ended"),
            Error::Transcript(err) => {
                write!(f, "failed to save the conversation: {err}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Transcript(err) => Some(err),
            _ => None,
        }
    }
}
