//! Web search providers for the functions exposed to the model.
//!
//! [`SearchProvider`] is the seam between the search functions and the
//! backend. [`DuckDuckGo`] is the only backend for now, tests plug in their
//! own fakes.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod duckduckgo;
mod error;
mod record;

use async_trait::async_trait;

pub use duckduckgo::{DuckDuckGo, DuckDuckGoConfig, DuckDuckGoConfigBuilder};
pub use error::{Error, ErrorKind};
pub use record::{AnswerRecord, NewsRecord, TextRecord};

/// A backend that answers the three query shapes.
///
/// Implementations return the records in the order the backend ranks them.
/// Callers decide how many of them to keep.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// General web results.
    async fn text(&self, keywords: &str) -> Result<Vec<TextRecord>, Error>;

    /// Direct answers, e.g. an abstract from an encyclopedia.
    async fn answers(&self, keywords: &str)
    -> Result<Vec<AnswerRecord>, Error>;

    /// News articles.
    async fn news(&self, keywords: &str) -> Result<Vec<NewsRecord>, Error>;
}
