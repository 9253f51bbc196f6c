use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::{AnswerRecord, Error, ErrorKind, NewsRecord, TextRecord};

static RESULT: LazyLock<Selector> = LazyLock::new(|| selector("div.result"));
static RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("a.result__a"));
static RESULT_SNIPPET: LazyLock<Selector> =
    LazyLock::new(|| selector(".result__snippet"));
static VQD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"vqd=["']?([\w-]+)["'&]"#).expect("invalid vqd pattern")
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Extracts web results from the HTML-only results page.
pub fn text_records(page: &str) -> Vec<TextRecord> {
    let document = Html::parse_document(page);
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for result in document.select(&RESULT) {
        let is_ad = result
            .value()
            .classes()
            .any(|class| class == "result--ad");
        if is_ad {
            continue;
        }
        let Some(link) = result.select(&RESULT_LINK).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href").and_then(resolve_href)
        else {
            continue;
        };
        if !seen.insert(href.clone()) {
            continue;
        }

        let body = result
            .select(&RESULT_SNIPPET)
            .next()
            .map(element_text)
            .unwrap_or_default();
        records.push(TextRecord {
            title: element_text(link),
            href,
            body,
        });
    }

    debug!("parsed {} text results", records.len());
    records
}

/// Result links go through a redirect, `//duckduckgo.com/l/?uddg=<target>`.
fn resolve_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_owned()
    };
    let url = Url::parse(&absolute).ok()?;
    if url.path() == "/l/" {
        return url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned());
    }
    Some(url.into())
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips markup and decodes entities.
fn plain_text(fragment: &str) -> String {
    let fragment = Html::parse_fragment(fragment);
    collapse_whitespace(&fragment.root_element().text().collect::<String>())
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Group {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Topics")]
        topics: Vec<Topic>,
    },
    Topic(Topic),
}

#[derive(Deserialize)]
struct Topic {
    #[serde(default, rename = "Text")]
    text: String,
    #[serde(default, rename = "FirstURL")]
    first_url: String,
    #[serde(default, rename = "Icon")]
    icon: Option<Icon>,
}

#[derive(Deserialize)]
struct Icon {
    #[serde(default, rename = "URL")]
    url: String,
}

/// Flattens an Instant Answer response into records.
///
/// The direct answer and the abstract come first, followed by related topics
/// in the order the API lists them. Grouped topics carry the group name.
pub fn answer_records(
    body: &str,
    site_url: &str,
) -> Result<Vec<AnswerRecord>, Error> {
    let answer: InstantAnswer = serde_json::from_str(body)
        .map_err(|err| Error::new(ErrorKind::InvalidResponse, err.to_string()))?;

    let mut records = Vec::new();
    for text in [answer.answer, answer.abstract_text] {
        if !text.is_empty() {
            records.push(AnswerRecord {
                icon: None,
                text,
                topic: None,
                url: answer.abstract_url.clone(),
            });
        }
    }

    let to_record = |topic: Topic, group: Option<&str>| {
        if topic.text.is_empty() {
            return None;
        }
        let icon = topic
            .icon
            .map(|icon| icon.url)
            .filter(|url| !url.is_empty())
            .map(|url| {
                if url.starts_with('/') {
                    format!("{site_url}{url}")
                } else {
                    url
                }
            });
        Some(AnswerRecord {
            icon,
            text: topic.text,
            topic: group.map(ToOwned::to_owned),
            url: topic.first_url,
        })
    };
    for related in answer.related_topics {
        match related {
            RelatedTopic::Topic(topic) => {
                records.extend(to_record(topic, None));
            }
            RelatedTopic::Group { name, topics } => {
                records.extend(
                    topics
                        .into_iter()
                        .filter_map(|topic| to_record(topic, Some(&name))),
                );
            }
        }
    }

    Ok(records)
}

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsItem>,
}

#[derive(Deserialize)]
struct NewsItem {
    date: i64,
    title: String,
    #[serde(default)]
    excerpt: String,
    url: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    source: String,
}

/// Converts a `news.js` response into records.
pub fn news_records(body: &str) -> Result<Vec<NewsRecord>, Error> {
    let response: NewsResponse = serde_json::from_str(body)
        .map_err(|err| Error::new(ErrorKind::InvalidResponse, err.to_string()))?;

    let mut seen = HashSet::new();
    let records = response
        .results
        .into_iter()
        .filter(|item| seen.insert(item.url.clone()))
        .map(|item| NewsRecord {
            date: DateTime::from_timestamp(item.date, 0)
                .map(|date| date.to_rfc3339())
                .unwrap_or_default(),
            title: plain_text(&item.title),
            body: plain_text(&item.excerpt),
            url: item.url,
            image: item.image.filter(|image| !image.is_empty()),
            source: item.source,
        })
        .collect();
    Ok(records)
}

/// Finds the token that the news endpoint requires.
pub fn vqd(page: &str) -> Result<String, Error> {
    VQD.captures(page)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_owned())
        .ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse, "no vqd token in the page")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_records() {
        let records = text_records(include_str!("../../fixtures/text.html"));
        assert_eq!(records.len(), 7);

        let first = &records[0];
        assert_eq!(first.title, "Rust Programming Language");
        assert_eq!(first.href, "https://www.rust-lang.org/");
        assert_eq!(
            first.body,
            "A language empowering everyone to build reliable and efficient software."
        );

        // Ads are skipped and duplicated links are dropped.
        assert!(records.iter().all(|r| !r.href.contains("ads.example")));
        let unique = records.iter().map(|r| &r.href).collect::<HashSet<_>>();
        assert_eq!(unique.len(), records.len());
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(
            resolve_href(
                "//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&rut=abc"
            )
            .as_deref(),
            Some("https://doc.rust-lang.org/book/")
        );
        assert_eq!(
            resolve_href("https://example.com/page").as_deref(),
            Some("https://example.com/page")
        );
        assert_eq!(resolve_href("not a url"), None);
    }

    #[test]
    fn test_answer_records() {
        let records = answer_records(
            include_str!("../../fixtures/answers.json"),
            "https://duckduckgo.com",
        )
        .unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].topic, None);
        assert!(records[0].text.starts_with("Rust is a general-purpose"));
        assert_eq!(
            records[0].url,
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );

        assert_eq!(
            records[1].icon.as_deref(),
            Some("https://duckduckgo.com/i/rust.png")
        );
        assert_eq!(records[3].topic.as_deref(), Some("Software"));
    }

    #[test]
    fn test_empty_answers() {
        let records =
            answer_records(r#"{"AbstractText": "", "RelatedTopics": []}"#, "")
                .unwrap();
        assert!(records.is_empty());
        assert!(answer_records("<html>", "").is_err());
    }

    #[test]
    fn test_news_records() {
        let records =
            news_records(include_str!("../../fixtures/news.json")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2023-11-14T22:13:20+00:00");
        assert_eq!(records[0].title, "Rust 1.74 released & ready");
        assert_eq!(records[0].body, "The Rust team is happy to announce a new version.");
        assert_eq!(records[0].image, None);
        assert_eq!(records[1].image.as_deref(), Some("https://img.example/reg.jpg"));
    }

    #[test]
    fn test_vqd() {
        let page = include_str!("../../fixtures/search_page.html");
        assert_eq!(
            vqd(page).unwrap(),
            "4-211153917806716294468311376271624381469"
        );
        assert_eq!(vqd("vqd='4-123'").unwrap(), "4-123");
        assert_eq!(vqd("<html></html>").unwrap_err().kind(), ErrorKind::InvalidResponse);
    }
}
