use serde::{Deserialize, Serialize};

/// A general web result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRecord {
    /// Title of the page.
    pub title: String,
    /// Link to the page.
    pub href: String,
    /// Snippet of the page.
    pub body: String,
}

/// A direct answer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Icon of the source, if any.
    pub icon: Option<String>,
    /// The answer text.
    pub text: String,
    /// The topic group this answer belongs to, `None` for the main abstract.
    pub topic: Option<String>,
    /// Link to the source.
    pub url: String,
}

/// A news article.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Publication time in RFC 3339.
    pub date: String,
    /// Headline.
    pub title: String,
    /// Excerpt of the article.
    pub body: String,
    /// Link to the article.
    pub url: String,
    /// Cover image, if any.
    pub image: Option<String>,
    /// The publisher.
    pub source: String,
}
