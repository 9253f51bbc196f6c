use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use duck_chat::core::model::Role;
use duck_chat::core::{SessionBuilder, TurnOutcome};
use duck_chat::{SYSTEM_PROMPT, build_registry};
use duck_chat_search::{
    AnswerRecord, Error, NewsRecord, SearchProvider, TextRecord,
};
use duck_chat_test_model::{PresetResponse, TestModelProvider};
use serde_json::{Value, json};

struct Pond;

#[async_trait]
impl SearchProvider for Pond {
    async fn text(&self, keywords: &str) -> Result<Vec<TextRecord>, Error> {
        Ok((1..=9)
            .map(|idx| TextRecord {
                title: format!("{keywords} {idx}"),
                href: format!("https://pond.example/{idx}"),
                body: "Quack".to_owned(),
            })
            .collect())
    }

    async fn answers(&self, _keywords: &str) -> Result<Vec<AnswerRecord>, Error> {
        Ok(vec![])
    }

    async fn news(&self, keywords: &str) -> Result<Vec<NewsRecord>, Error> {
        Ok(vec![NewsRecord {
            date: "2023-11-14T22:13:20+00:00".to_owned(),
            title: format!("{keywords} spotted"),
            body: String::new(),
            url: "https://news.example/ducks".to_owned(),
            image: None,
            source: "Pond Times".to_owned(),
        }])
    }
}

#[tokio::test]
async fn test_search_then_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut provider = TestModelProvider::default();
    provider.add_assistant_response_step(PresetResponse::function_call(
        "search_text",
        json!({ "query": "ducks" }),
    ));
    provider.add_assistant_response_step(PresetResponse::function_call(
        "search_news",
        json!({}),
    ));
    provider.add_assistant_response_step(PresetResponse::text(
        "Hi! I'm DuckDuckChat! Ducks are [everywhere](https://pond.example/1).",
    ));
    provider.add_assistant_response_step(PresetResponse::function_call(
        "exit_conversation",
        json!({}),
    ));

    let registry = Arc::new(build_registry(Arc::new(Pond)));
    let mut session = SessionBuilder::with_model_provider(provider.clone())
        .with_registry(registry)
        .with_system_prompt(SYSTEM_PROMPT)
        .with_transcript_dir(dir.path())
        .build();

    let outcome = session.send_user_message("Tell me about ducks").await.unwrap();
    let TurnOutcome::Reply(reply) = outcome else {
        panic!("expected a reply");
    };
    assert!(reply.starts_with("Hi! I'm DuckDuckChat!"));

    let messages = session.messages();
    assert_eq!(messages.len(), 7);
    let results: Vec<Value> =
        serde_json::from_str(messages[3].content.as_deref().unwrap()).unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(messages[5].name.as_deref(), Some("search_news"));
    assert_eq!(messages[5].content.as_deref(), Some("No query provided"));

    let outcome = session.send_user_message("Thanks, bye!").await.unwrap();
    let TurnOutcome::Ended(path) = outcome else {
        panic!("expected the session to end");
    };
    assert!(session.is_ended());

    let transcript: Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let entries = transcript.as_array().unwrap();
    let functions = entries[0]["functions"].as_array().unwrap();
    let names = functions
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        ["search_text", "search_answers", "search_news", "exit_conversation"]
    );
    assert_eq!(functions[0]["parameters"]["required"], json!(["query"]));
    assert_eq!(entries[1]["role"], "system");
    assert_eq!(entries[1]["content"], SYSTEM_PROMPT);
    assert_eq!(
        entries.last().unwrap(),
        &json!({ "role": "system", "content": "Conversation ended." })
    );
    // functions + 9 messages + end marker
    assert_eq!(entries.len(), 11);
    assert_eq!(
        session.messages().iter().filter(|m| m.role == Role::User).count(),
        2
    );
}
