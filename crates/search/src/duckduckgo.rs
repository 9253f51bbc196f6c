mod config;
mod parse;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::Instrument;

pub use config::{DuckDuckGoConfig, DuckDuckGoConfigBuilder};

use crate::{AnswerRecord, Error, NewsRecord, SearchProvider, TextRecord};

/// A [`SearchProvider`] backed by DuckDuckGo.
///
/// Text results are scraped from the HTML-only results page, answers come
/// from the Instant Answer API, and news from the `news.js` endpoint, which
/// needs a `vqd` token scraped from the regular search page first.
#[derive(Clone, Debug)]
pub struct DuckDuckGo {
    client: Client,
    config: Arc<DuckDuckGoConfig>,
}

impl DuckDuckGo {
    /// Creates a new client with the given configuration.
    #[inline]
    pub fn new(config: DuckDuckGoConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    async fn fetch(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<String, Error> {
        trace!("fetching {url} with {query:?}");
        let body = self
            .client
            .get(url)
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    async fn vqd(&self, keywords: &str) -> Result<String, Error> {
        let url = format!("{}/", self.config.site_url);
        let page = self.fetch(url, &[("q", keywords)]).await?;
        parse::vqd(&page)
    }
}

impl Default for DuckDuckGo {
    #[inline]
    fn default() -> Self {
        Self::new(DuckDuckGoConfigBuilder::new().build())
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    async fn text(&self, keywords: &str) -> Result<Vec<TextRecord>, Error> {
        let url = format!("{}/html/", self.config.html_url);
        let query = [("q", keywords), ("kl", self.config.region.as_str())];
        let page = self
            .fetch(url, &query)
            .instrument(debug_span!("ddg text"))
            .await?;
        Ok(parse::text_records(&page))
    }

    async fn answers(
        &self,
        keywords: &str,
    ) -> Result<Vec<AnswerRecord>, Error> {
        let url = format!("{}/", self.config.api_url);
        let query = [
            ("q", keywords),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ];
        let body = self
            .fetch(url, &query)
            .instrument(debug_span!("ddg answers"))
            .await?;
        parse::answer_records(&body, &self.config.site_url)
    }

    async fn news(&self, keywords: &str) -> Result<Vec<NewsRecord>, Error> {
        let span = debug_span!("ddg news");
        async {
            let vqd = self.vqd(keywords).await?;
            let url = format!("{}/news.js", self.config.site_url);
            let query = [
                ("l", self.config.region.as_str()),
                ("o", "json"),
                ("noamp", "1"),
                ("q", keywords),
                ("vqd", vqd.as_str()),
                ("p", "-1"),
            ];
            let body = self.fetch(url, &query).await?;
            parse::news_records(&body)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ErrorKind;

    fn provider(server: &MockServer) -> DuckDuckGo {
        let config = DuckDuckGoConfigBuilder::new()
            .with_html_url(server.uri())
            .with_api_url(server.uri())
            .with_site_url(server.uri())
            .build();
        DuckDuckGo::new(config)
    }

    #[tokio::test]
    async fn test_text_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "rust language"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                include_str!("../fixtures/text.html"),
                "text/html",
            ))
            .mount(&server)
            .await;

        let records = provider(&server).text("rust language").await.unwrap();
        assert_eq!(records.len(), 7);
        assert_eq!(records[0].href, "https://www.rust-lang.org/");
    }

    #[tokio::test]
    async fn test_user_agent_and_region() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(header("user-agent", "duck-test/1.0"))
            .and(query_param("kl", "us-en"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                include_str!("../fixtures/text.html"),
                "text/html",
            ))
            .mount(&server)
            .await;

        let config = DuckDuckGoConfigBuilder::new()
            .with_html_url(server.uri())
            .with_user_agent("duck-test/1.0")
            .with_region("us-en")
            .build();
        let records = DuckDuckGo::new(config).text("rust").await.unwrap();
        assert_eq!(records.len(), 7);
    }

    #[tokio::test]
    async fn test_news_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                include_str!("../fixtures/search_page.html"),
                "text/html",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news.js"))
            .and(query_param("vqd", "4-211153917806716294468311376271624381469"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                include_str!("../fixtures/news.json"),
                "application/json",
            ))
            .mount(&server)
            .await;

        let records = provider(&server).news("rust").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].source, "The Register");
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider(&server).answers("rust").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
    }
}
