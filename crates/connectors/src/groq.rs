//! Groq chat completions client.
//!
//! Groq serves an OpenAI-compatible `chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConnectorError;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CONTENT_MODEL: &str = "llama-3.1-70b-versatile";
pub const DEFAULT_FAST_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Anything that can answer a chat request with text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ConnectorError>;
}

/// Groq API client.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Result<Self, ConnectorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConnectorError::Config("GROQ_API_KEY is not set".to_string()));
        }
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("studio-cms/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<String, ConnectorError> {
        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        match res.status() {
            s if s.is_success() => {
                let body: ChatResponse = res.json().await?;
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| ConnectorError::Decode("no completion choices returned".to_string()))
            }
            StatusCode::UNAUTHORIZED => Err(ConnectorError::Auth("invalid Groq API key".to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(ConnectorError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ConnectorError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl ChatCompletion for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ConnectorError> {
        (|| async { self.send_request(request).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &ConnectorError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Groq call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }
}

/// Pull JSON out of a reply that may wrap it in a markdown code fence.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        let content_start = text[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    // Models sometimes add prose around a bare object.
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let input = r#"{"key": "value"}"#;
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = "Here are the tags:\n```json\n{\"metaTitle\": \"x\"}\n```";
        assert_eq!(extract_json(input), r#"{"metaTitle": "x"}"#);
    }

    #[test]
    fn test_extract_json_generic_code_block() {
        let input = "```\n{\"key\": 1}\n```";
        assert_eq!(extract_json(input), r#"{"key": 1}"#);
    }

    #[test]
    fn test_extract_json_surrounded_by_prose() {
        let input = "Sure! {\"keywords\": [\"villa\"]} Hope this helps.";
        assert_eq!(extract_json(input), r#"{"keywords": ["villa"]}"#);
    }

    #[test]
    fn test_client_requires_key() {
        assert!(GroqClient::new("  ", None).is_err());
        let client = GroqClient::new("gsk_test", Some("http://localhost:9999/v1/".into())).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_request_serializes_as_openai_body() {
        let request = ChatRequest {
            model: DEFAULT_FAST_MODEL.to_string(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            temperature: 0.5,
            max_tokens: 500,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama-3.1-8b-instant");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["max_tokens"], 500);
    }
}
