//! Integration tests for the text-message handler against a mock Bot API
//!
//! Run with: cargo test -p cuohe --test handler_test

use std::sync::Arc;

use async_trait::async_trait;
use cuohe::telegram::handlers::{handle_text_message, HandlerDeps};
use cuohe::telegram::MAX_MESSAGE_LENGTH;
use cuohecore::classify::GroupLinks;
use cuohecore::history::ChatMessage;
use cuohecore::llm::ChatCompleter;
use cuohecore::router::{RouterSettings, GENERIC_FAILURE};
use cuohecore::sheets::{MemorySheets, Worksheet};
use cuohecore::{AppResult, MessageRouter};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use teloxide::prelude::*;
use teloxide::types::Message;
use wiremock::matchers::{body_partial_json, method, path_regex};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// Completer that always answers with the same text.
struct FixedCompleter(String);

#[async_trait]
impl ChatCompleter for FixedCompleter {
    async fn complete(&self, _messages: &[ChatMessage]) -> AppResult<String> {
        Ok(self.0.clone())
    }
}

fn links() -> GroupLinks {
    GroupLinks {
        main: "https://t.me/+main".to_string(),
        vip: "https://t.me/+vip".to_string(),
    }
}

fn deps_with_sheets(reply: String) -> (HandlerDeps, Arc<MemorySheets>) {
    let settings = RouterSettings {
        channel: "@TestChannel".to_string(),
        links: links(),
    };
    let sheets = Arc::new(MemorySheets::new());
    let router = MessageRouter::new(settings, sheets.clone(), Arc::new(FixedCompleter(reply)));
    let deps = HandlerDeps::new(Arc::new(router), links(), None, Some("cuohe_bot".to_string()), UserId(1));
    (deps, sheets)
}

fn deps(reply: String) -> HandlerDeps {
    deps_with_sheets(reply).0
}

fn private_message(text: &str) -> Message {
    serde_json::from_value(json!({
        "message_id": 10,
        "date": 1234567890,
        "chat": {"id": 42, "type": "private", "first_name": "Test"},
        "from": {"id": 42, "is_bot": false, "first_name": "Test", "username": "alice"},
        "text": text
    }))
    .unwrap()
}

fn sent_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "result": {
            "message_id": 11,
            "date": 1234567891,
            "chat": {"id": 42, "type": "private", "first_name": "Test"},
            "text": "ok"
        }
    }))
}

fn send_message() -> MockBuilder {
    Mock::given(method("POST")).and(path_regex(r"(?i)/bot[^/]+/sendmessage$"))
}

fn bot_for(server: &MockServer) -> Bot {
    Bot::new("123456:TEST").set_api_url(url::Url::parse(&server.uri()).unwrap())
}

async fn sent_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
        .filter_map(|body| body["text"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_long_reply_is_truncated() {
    let server = MockServer::start().await;
    send_message().respond_with(sent_ok()).mount(&server).await;

    let bot = bot_for(&server);
    handle_text_message(&bot, &private_message("今天天气怎么样"), &deps("长".repeat(5000)))
        .await
        .unwrap();

    let texts = sent_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].chars().count() <= MAX_MESSAGE_LENGTH);
    assert!(texts[0].starts_with("长长长"));
}

#[tokio::test]
async fn test_rejected_reply_gets_generic_failure() {
    let server = MockServer::start().await;
    send_message()
        .and(body_partial_json(json!({"text": "模型回复"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message is too long"
        })))
        .mount(&server)
        .await;
    send_message()
        .and(body_partial_json(json!({"text": GENERIC_FAILURE})))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&server)
        .await;

    let bot = bot_for(&server);
    handle_text_message(&bot, &private_message("今天天气怎么样"), &deps("模型回复".to_string()))
        .await
        .unwrap();

    assert_eq!(sent_texts(&server).await, vec!["模型回复".to_string(), GENERIC_FAILURE.to_string()]);
}

#[tokio::test]
async fn test_multiline_report_text_reaches_router_intact() {
    let server = MockServer::start().await;
    send_message().respond_with(sent_ok()).mount(&server).await;

    let bot = bot_for(&server);
    let (deps, sheets) = deps_with_sheets("unused".to_string());
    handle_text_message(&bot, &private_message("@cuohe_bot 举报\n第一行  第二行"), &deps)
        .await
        .unwrap();

    let texts = sent_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("举报信息已记录"));

    let rows = sheets.rows(Worksheet::Reports);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "举报\n第一行  第二行");
}
