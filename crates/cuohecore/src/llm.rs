//! Chat-completion client for an OpenAI-compatible API.
//!
//! One request per call: no retry, no backoff. Callers turn errors into the
//! user-visible reply themselves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{AppError, AppResult};
use crate::history::ChatMessage;

/// Anything that can answer a role-tagged conversation.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder().timeout(config::network::timeout()).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: config::llm::TEMPERATURE,
        })
    }

    /// Client configured from OPENAI_BASE_URL / OPENAI_API_KEY / OPENAI_MODEL.
    pub fn from_config() -> AppResult<Self> {
        Self::new(
            config::llm::BASE_URL.as_str(),
            config::llm::API_KEY.as_str(),
            config::llm::MODEL.as_str(),
        )
    }
}

#[async_trait]
impl ChatCompleter for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> AppResult<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = AppError::from_response(response).await;
            log::warn!("completion API call failed: {}", err);
            return Err(err);
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Completion("response has no choices[0].message.content".to_string()))
    }
}

/// Single-turn question, no history. Errors come back as text prefixed with `error_prefix`.
pub async fn ask_once(completer: &dyn ChatCompleter, prompt: &str, error_prefix: &str) -> String {
    match completer.complete(&[ChatMessage::user(prompt)]).await {
        Ok(reply) => reply,
        Err(e) => format!("{}{}", error_prefix, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(format!("{}/v1", server.uri()), "sk-test", "gpt-3.5-turbo").unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_history_and_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.7,
                "messages": [
                    {"role": "user", "content": "你好"},
                    {"role": "assistant", "content": "您好"},
                    {"role": "user", "content": "有担保吗"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "有的"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let reply = client
            .complete(&[
                ChatMessage::user("你好"),
                ChatMessage::assistant("您好"),
                ChatMessage::user("有担保吗"),
            ])
            .await
            .unwrap();
        assert_eq!(reply, "有的");
    }

    #[tokio::test]
    async fn test_complete_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("401"), "{}", text);
        assert!(text.contains("invalid api key"), "{}", text);
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).await.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, AppError::Completion(_)));
    }

    #[tokio::test]
    async fn test_ask_once_formats_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let reply = ask_once(&client, "hi", "AI接口异常: ").await;
        assert!(reply.starts_with("AI接口异常: "));
        assert!(reply.contains("boom"));
    }
}
