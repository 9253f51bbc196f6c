use std::sync::Arc;

use duck_chat_core::function::{Error as FunctionError, Function, FunctionResult};
use duck_chat_search::SearchProvider;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The most records `search_text` hands back to the model.
pub const MAX_TEXT_RESULTS: usize = 5;

const NO_QUERY: &str = "No query provided";

/// Arguments shared by all search functions.
///
/// The query is optional here so that a call without one can be answered
/// instead of rejected. The schemas below still declare it required.
#[derive(Deserialize)]
pub struct SearchParameters {
    #[serde(default)]
    query: Option<String>,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct QueryParameters {
    #[schemars(description = "The query to search for")]
    query: String,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct QuestionParameters {
    #[schemars(description = "The question to answer")]
    query: String,
}

/// Which search a [`SearchFunction`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchKind {
    /// Web results, see [`MAX_TEXT_RESULTS`].
    Text,
    /// Instant answers.
    Answers,
    /// News articles.
    News,
}

impl SearchKind {
    /// Returns the function name exposed to the model.
    pub fn function_name(self) -> &'static str {
        match self {
            SearchKind::Text => "search_text",
            SearchKind::Answers => "search_answers",
            SearchKind::News => "search_news",
        }
    }

    fn description(self) -> &'static str {
        match self {
            SearchKind::Text => "Search DuckDuckGo for a query using keywords",
            SearchKind::Answers => {
                "Search DuckDuckGo for an answer to a question and return the result"
            }
            SearchKind::News => {
                "Search DuckDuckGo for news and return the result"
            }
        }
    }

    fn parameter_schema(self) -> Value {
        match self {
            SearchKind::Answers => schema_for!(QuestionParameters).to_value(),
            SearchKind::Text | SearchKind::News => {
                schema_for!(QueryParameters).to_value()
            }
        }
    }
}

/// A function that searches the web and returns the records as a JSON
/// array.
///
/// A call without a query is answered with `No query provided` instead of
/// an error, so the model can try again.
pub struct SearchFunction {
    kind: SearchKind,
    provider: Arc<dyn SearchProvider>,
    parameter_schema: Value,
}

impl SearchFunction {
    /// Creates a search function backed by `provider`.
    pub fn new(kind: SearchKind, provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            kind,
            provider,
            parameter_schema: kind.parameter_schema(),
        }
    }
}

fn to_json<T: Serialize>(records: &[T]) -> FunctionResult {
    serde_json::to_string(records)
        .map_err(|err| FunctionError::execution_error().with_reason(err.to_string()))
}

impl Function for SearchFunction {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        self.kind.function_name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchParameters,
    ) -> impl Future<Output = FunctionResult> + Send + 'static {
        let kind = self.kind;
        let provider = Arc::clone(&self.provider);
        async move {
            let Some(query) = input.query.filter(|q| !q.trim().is_empty())
            else {
                return Ok(NO_QUERY.to_owned());
            };
            info!("searching {} for {query:?}", kind.function_name());

            let result = match kind {
                SearchKind::Text => {
                    provider.text(&query).await.map(|mut records| {
                        records.truncate(MAX_TEXT_RESULTS);
                        to_json(&records)
                    })
                }
                SearchKind::Answers => {
                    provider.answers(&query).await.map(|records| to_json(&records))
                }
                SearchKind::News => {
                    provider.news(&query).await.map(|records| to_json(&records))
                }
            };
            match result {
                Ok(json) => json,
                Err(err) => Err(FunctionError::execution_error()
                    .with_reason(format!("search failed: {err}"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use duck_chat_search::{
        AnswerRecord, Error as SearchError, ErrorKind as SearchErrorKind,
        NewsRecord, TextRecord,
    };
    use serde_json::json;

    use super::*;

    /// Returns `count` records for every query. Text search fails if `count`
    /// is zero.
    struct FakeSearch {
        count: usize,
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn text(&self, keywords: &str) -> Result<Vec<TextRecord>, SearchError> {
            if self.count == 0 {
                return Err(SearchError::new(SearchErrorKind::Request, "offline"));
            }
            Ok((0..self.count)
                .map(|idx| TextRecord {
                    title: format!("{keywords} #{idx}"),
                    href: format!("https://example.com/{idx}"),
                    body: String::new(),
                })
                .collect())
        }

        async fn answers(
            &self,
            keywords: &str,
        ) -> Result<Vec<AnswerRecord>, SearchError> {
            Ok((0..self.count)
                .map(|_| AnswerRecord {
                    icon: None,
                    text: keywords.to_owned(),
                    topic: None,
                    url: "https://example.com".to_owned(),
                })
                .collect())
        }

        async fn news(&self, keywords: &str) -> Result<Vec<NewsRecord>, SearchError> {
            Ok((0..self.count)
                .map(|idx| NewsRecord {
                    date: "2023-11-14T22:13:20+00:00".to_owned(),
                    title: format!("{keywords} #{idx}"),
                    body: String::new(),
                    url: format!("https://news.example.com/{idx}"),
                    image: None,
                    source: "Example News".to_owned(),
                })
                .collect())
        }
    }

    fn function(kind: SearchKind, count: usize) -> SearchFunction {
        SearchFunction::new(kind, Arc::new(FakeSearch { count }))
    }

    fn query(query: &str) -> SearchParameters {
        SearchParameters {
            query: Some(query.to_owned()),
        }
    }

    #[tokio::test]
    async fn test_text_results_are_capped() {
        for (count, expected) in [(12, MAX_TEXT_RESULTS), (2, 2)] {
            let output = function(SearchKind::Text, count)
                .execute(query("ducks"))
                .await
                .unwrap();
            let records: Vec<Value> = serde_json::from_str(&output).unwrap();
            assert_eq!(records.len(), expected);
            assert_eq!(records[0]["title"], "ducks #0");
        }
    }

    #[tokio::test]
    async fn test_answers_are_not_capped() {
        let output = function(SearchKind::Answers, 8)
            .execute(query("ducks"))
            .await
            .unwrap();
        let records: Vec<Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0]["icon"], Value::Null);
    }

    #[tokio::test]
    async fn test_news_are_not_capped() {
        let output = function(SearchKind::News, 8)
            .execute(query("ducks"))
            .await
            .unwrap();
        let records: Vec<Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[7]["title"], "ducks #7");
        assert_eq!(records[0]["source"], "Example News");
    }

    #[tokio::test]
    async fn test_missing_query() {
        for input in [SearchParameters { query: None }, query("  ")] {
            let output = function(SearchKind::News, 1).execute(input).await;
            assert_eq!(output.unwrap(), "No query provided");
        }
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let err = function(SearchKind::Text, 0)
            .execute(query("ducks"))
            .await
            .unwrap_err();
        assert!(err.reason().contains("offline"));
    }

    #[test]
    fn test_parameter_schema() {
        for (kind, description) in [
            (SearchKind::Text, "The query to search for"),
            (SearchKind::Answers, "The question to answer"),
            (SearchKind::News, "The query to search for"),
        ] {
            let function = function(kind, 0);
            let schema = function.parameter_schema();
            assert_eq!(schema["type"], "object");
            assert_eq!(schema["required"], json!(["query"]));
            assert_eq!(schema["properties"]["query"]["type"], "string");
            assert_eq!(schema["properties"]["query"]["description"], description);
        }
    }
}
