//! Functions exposed to the model.

mod search;

use std::sync::Arc;

use duck_chat_core::function::Registry;
use duck_chat_search::SearchProvider;

pub use search::{MAX_TEXT_RESULTS, SearchFunction, SearchKind, SearchParameters};

/// Builds the registry with every search function and `exit_conversation`.
pub fn build_registry(provider: Arc<dyn SearchProvider>) -> Registry {
    Registry::builder()
        .with_function(SearchFunction::new(SearchKind::Text, provider.clone()))
        .with_function(SearchFunction::new(
            SearchKind::Answers,
            provider.clone(),
        ))
        .with_function(SearchFunction::new(SearchKind::News, provider))
        .with_exit_conversation()
        .build()
}

#[cfg(test)]
mod tests {
    use duck_chat_core::model::FunctionCall;
    use duck_chat_search::DuckDuckGo;

    use super::*;

    #[test]
    fn test_registry_order() {
        let registry = build_registry(Arc::new(DuckDuckGo::default()));
        let names = registry
            .descriptors()
            .into_iter()
            .map(|d| d.name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            ["search_text", "search_answers", "search_news", "exit_conversation"]
        );
    }

    #[tokio::test]
    async fn test_null_arguments() {
        let registry = build_registry(Arc::new(DuckDuckGo::default()));
        for arguments in ["null", "", "{}"] {
            let output = registry
                .invoke(&FunctionCall::new("search_text", arguments))
                .await;
            assert_eq!(output.unwrap(), "No query provided");
        }
    }
}
