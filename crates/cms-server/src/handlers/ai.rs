//! AI content handlers.

use axum::{extract::State, Json};
use studio_connectors::writer::{ContentRequest, GeneratedContent, SeoTags};

use crate::error::AppResult;
use crate::services::ai::{
    ImproveRequest, ImproveResponse, OutlineRequest, OutlineResponse, SeoTagsRequest,
};
use crate::services::AiService;

/// `POST /api/ai/content`
///
/// ```json
/// { "topic": "Modern majlis design", "contentType": "blog", "keywords": ["majlis"], "language": "en" }
/// ```
pub async fn generate(
    State(service): State<AiService>,
    Json(request): Json<ContentRequest>,
) -> AppResult<Json<GeneratedContent>> {
    Ok(Json(service.generate(&request).await?))
}

/// `POST /api/ai/outline`
pub async fn outline(
    State(service): State<AiService>,
    Json(request): Json<OutlineRequest>,
) -> AppResult<Json<OutlineResponse>> {
    Ok(Json(service.outline(&request).await?))
}

/// `POST /api/ai/improve`
pub async fn improve(
    State(service): State<AiService>,
    Json(request): Json<ImproveRequest>,
) -> AppResult<Json<ImproveResponse>> {
    Ok(Json(service.improve(&request).await?))
}

/// `POST /api/ai/seo-tags`
pub async fn seo_tags(
    State(service): State<AiService>,
    Json(request): Json<SeoTagsRequest>,
) -> AppResult<Json<SeoTags>> {
    Ok(Json(service.seo_tags(&request).await?))
}
