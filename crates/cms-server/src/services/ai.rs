//! AI content generation over Groq.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use studio_connectors::writer::{ContentRequest, GeneratedContent, Improvements, SeoTags};
use studio_connectors::{ContentWriter, GroqClient};

use crate::config::AiConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineRequest {
    pub topic: String,
    #[serde(default = "default_outline_type")]
    pub content_type: String,
}

fn default_outline_type() -> String {
    "blog".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlineResponse {
    pub outline: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImproveRequest {
    pub content: String,
    #[serde(default)]
    pub improvements: Improvements,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImproveResponse {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeoTagsRequest {
    pub content: String,
    pub topic: String,
}

/// Unconfigured (no API key) is a valid state: every call then fails
/// with a configuration error and the rest of the CMS keeps working.
#[derive(Clone)]
pub struct AiService {
    writer: Option<ContentWriter>,
}

impl AiService {
    pub fn new(config: &AiConfig) -> AppResult<Self> {
        let Some(api_key) = config.api_key() else {
            tracing::info!("GROQ_API_KEY not set, AI content generation disabled");
            return Ok(Self { writer: None });
        };

        let client = GroqClient::new(api_key, Some(config.base_url.clone()))?;
        let writer = ContentWriter::new(
            Arc::new(client),
            config.content_model.clone(),
            config.fast_model.clone(),
        );
        tracing::info!(model = %config.content_model, "AI content generation enabled");
        Ok(Self::with_writer(writer))
    }

    pub fn with_writer(writer: ContentWriter) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    fn writer(&self) -> AppResult<&ContentWriter> {
        self.writer
            .as_ref()
            .ok_or_else(|| AppError::Config("GROQ_API_KEY is not configured".to_string()))
    }

    pub async fn generate(&self, request: &ContentRequest) -> AppResult<GeneratedContent> {
        let writer = self.writer()?;
        let generated = writer.generate(request).await?;
        tracing::info!(
            topic = %request.topic,
            seo_score = generated.seo_score,
            "Content generated"
        );
        Ok(generated)
    }

    pub async fn outline(&self, request: &OutlineRequest) -> AppResult<OutlineResponse> {
        let topic = required(&request.topic, "topic")?;
        let outline = self.writer()?.outline(topic, &request.content_type).await;
        Ok(OutlineResponse { outline })
    }

    pub async fn improve(&self, request: &ImproveRequest) -> AppResult<ImproveResponse> {
        let content = required(&request.content, "content")?;
        let content = self.writer()?.improve(content, &request.improvements).await;
        Ok(ImproveResponse { content })
    }

    pub async fn seo_tags(&self, request: &SeoTagsRequest) -> AppResult<SeoTags> {
        let content = required(&request.content, "content")?;
        let topic = required(&request.topic, "topic")?;
        Ok(self.writer()?.seo_tags(content, topic).await)
    }
}

fn required<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use studio_connectors::groq::ChatRequest;
    use studio_connectors::{ChatCompletion, ConnectorError};

    struct Scripted(Result<String, ConnectorError>);

    #[async_trait]
    impl ChatCompletion for Scripted {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, ConnectorError> {
            self.0.clone()
        }
    }

    fn service(reply: Result<String, ConnectorError>) -> AiService {
        AiService::with_writer(ContentWriter::new(Arc::new(Scripted(reply)), "big", "small"))
    }

    #[tokio::test]
    async fn test_disabled_without_key() {
        let service = AiService::new(&AiConfig::default()).unwrap();
        assert!(!service.is_enabled());

        let err = service
            .outline(&OutlineRequest {
                topic: "Villa lighting".into(),
                content_type: "blog".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_outline_lines() {
        let service = service(Ok("1. Introduction\n\n2. Materials\n3. Budget".into()));
        let response = service
            .outline(&OutlineRequest {
                topic: "Majlis design".into(),
                content_type: "blog".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.outline, vec!["1. Introduction", "2. Materials", "3. Budget"]);
    }

    #[tokio::test]
    async fn test_improve_keeps_original_on_failure() {
        let service = service(Err(ConnectorError::Timeout));
        let response = service
            .improve(&ImproveRequest {
                content: "Original copy".into(),
                improvements: Improvements::default(),
            })
            .await
            .unwrap();
        assert_eq!(response.content, "Original copy");
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected() {
        let service = service(Ok(String::new()));
        let err = service
            .seo_tags(&SeoTagsRequest {
                content: "Some copy".into(),
                topic: "  ".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
