//! Configuration read from the environment.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::PathBuf;

use duck_chat_openai_model::{DEFAULT_MODEL, OpenAIConfig, OpenAIConfigBuilder};

/// Models that support function calling.
pub const MODELS: &[&str] = &[DEFAULT_MODEL, "gpt-4-0613"];

/// The directory where transcripts go unless configured otherwise.
pub const DEFAULT_CONVERSATIONS_DIR: &str = "conversations";

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// `OPENAI_MODEL` names a model that is not in [`MODELS`].
    UnsupportedModel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{name} environment variable is not set")
            }
            ConfigError::UnsupportedModel(model) => write!(
                f,
                "unsupported model `{model}`, expected one of: {}",
                MODELS.join(", ")
            ),
        }
    }
}

impl StdError for ConfigError {}

/// Everything the CLI needs to start a session.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The completion endpoint.
    pub openai: OpenAIConfig,
    /// Where transcripts are saved.
    pub conversations_dir: PathBuf,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration with `lookup` resolving variable names.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key =
            var("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let mut builder = OpenAIConfigBuilder::with_api_key(api_key);
        if let Some(model) = var("OPENAI_MODEL") {
            if !MODELS.contains(&model.as_str()) {
                return Err(ConfigError::UnsupportedModel(model));
            }
            builder = builder.with_model(model);
        }
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            builder = builder.with_base_url(base_url);
        }

        let conversations_dir = var("DUCK_CHAT_CONVERSATIONS_DIR")
            .unwrap_or_else(|| DEFAULT_CONVERSATIONS_DIR.to_owned());
        Ok(Self {
            openai: builder.build(),
            conversations_dir: PathBuf::from(conversations_dir),
        })
    }
}
