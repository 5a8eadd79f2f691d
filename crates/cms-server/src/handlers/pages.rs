//! Page API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::content::{block_catalog, BlockTypeInfo, Locale};
use crate::db::models::{
    LocaleQuery, LocalizedPage, PageCreateRequest, PageListQuery, PageResponse, PageUpdateRequest,
};
use crate::error::AppResult;
use crate::services::PageService;

/// `GET /api/pages`
///
/// `?published=true` limits the list to published pages.
pub async fn list(
    State(service): State<PageService>,
    Query(query): Query<PageListQuery>,
) -> AppResult<Json<Vec<PageResponse>>> {
    let pages = service.list(query.published.unwrap_or(false)).await?;
    Ok(Json(pages))
}

/// `POST /api/pages`
///
/// ```json
/// {
///   "title": { "en": "Luxury Villas", "ar": "فلل فاخرة" },
///   "slug": { "en": "luxury-villas", "ar": "فلل-فاخرة" },
///   "status": "published",
///   "blocks": [{ "type": "hero_banner", "data": { "titleEn": "..", "titleAr": ".." } }]
/// }
/// ```
pub async fn create(
    State(service): State<PageService>,
    Json(request): Json<PageCreateRequest>,
) -> AppResult<(StatusCode, Json<PageResponse>)> {
    let page = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

/// `GET /api/pages/{id}`
pub async fn get(
    State(service): State<PageService>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PageResponse>> {
    Ok(Json(service.get(id).await?))
}

/// `PUT /api/pages/{id}`
///
/// Partial update. When `blocks` is present the page's blocks are
/// replaced as a whole.
pub async fn update(
    State(service): State<PageService>,
    Path(id): Path<Uuid>,
    Json(request): Json<PageUpdateRequest>,
) -> AppResult<Json<PageResponse>> {
    Ok(Json(service.update(id, request).await?))
}

/// `DELETE /api/pages/{id}`
pub async fn delete(
    State(service): State<PageService>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/pages/slug/{slug}?locale=ar`
///
/// Published page with every block resolved for the locale.
pub async fn by_slug(
    State(service): State<PageService>,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> AppResult<Json<LocalizedPage>> {
    let locale = Locale::from_param(query.locale.as_deref());
    Ok(Json(service.localized_by_slug(&slug, locale).await?))
}

/// `GET /api/blocks`
///
/// Block types the editor offers.
pub async fn blocks() -> Json<Vec<BlockTypeInfo>> {
    Json(block_catalog())
}
