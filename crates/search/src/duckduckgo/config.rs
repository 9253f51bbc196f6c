/// Builder for [`DuckDuckGoConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DuckDuckGoConfigBuilder {
    html_url: Option<String>,
    api_url: Option<String>,
    site_url: Option<String>,
    user_agent: Option<String>,
    region: Option<String>,
}

impl DuckDuckGoConfigBuilder {
    /// Creates a builder with all defaults.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the HTML-only results page.
    #[inline]
    pub fn with_html_url<S: Into<String>>(mut self, url: S) -> Self {
        self.html_url = Some(url.into());
        self
    }

    /// Sets the base URL of the Instant Answer API.
    #[inline]
    pub fn with_api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the base URL of the main site, used for news.
    #[inline]
    pub fn with_site_url<S: Into<String>>(mut self, url: S) -> Self {
        self.site_url = Some(url.into());
        self
    }

    /// Sets the `User-Agent` header sent with every request.
    #[inline]
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the region code, e.g. `us-en`. Defaults to `wt-wt` (no region).
    #[inline]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> DuckDuckGoConfig {
        fn base(url: Option<String>, default: &str) -> String {
            url.as_deref()
                .unwrap_or(default)
                .trim_end_matches('/')
                .to_owned()
        }

        DuckDuckGoConfig {
            html_url: base(self.html_url, "https://html.duckduckgo.com"),
            api_url: base(self.api_url, "https://api.duckduckgo.com"),
            site_url: base(self.site_url, "https://duckduckgo.com"),
            user_agent: self.user_agent.unwrap_or_else(|| {
                concat!("duck-chat/", env!("CARGO_PKG_VERSION")).to_owned()
            }),
            region: self.region.unwrap_or_else(|| "wt-wt".to_owned()),
        }
    }
}

/// Configuration for [`DuckDuckGo`](crate::DuckDuckGo).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DuckDuckGoConfig {
    pub(crate) html_url: String,
    pub(crate) api_url: String,
    pub(crate) site_url: String,
    pub(crate) user_agent: String,
    pub(crate) region: String,
}
