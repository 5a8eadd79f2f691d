//! Blueprint API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::content::Locale;
use crate::db::models::{
    BlueprintCreateRequest, BlueprintRow, InstanceCreateRequest, InstanceRow, LocaleQuery,
};
use crate::error::AppResult;
use crate::services::blueprint::InstanceView;
use crate::services::BlueprintService;

/// `GET /api/blueprints`
pub async fn list(State(service): State<BlueprintService>) -> AppResult<Json<Vec<BlueprintRow>>> {
    Ok(Json(service.list().await?))
}

/// `POST /api/blueprints`
pub async fn create(
    State(service): State<BlueprintService>,
    Json(request): Json<BlueprintCreateRequest>,
) -> AppResult<(StatusCode, Json<BlueprintRow>)> {
    let blueprint = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(blueprint)))
}

/// `GET /api/blueprints/{id}/instances`
pub async fn list_instances(
    State(service): State<BlueprintService>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<InstanceRow>>> {
    Ok(Json(service.list_instances(id).await?))
}

/// `POST /api/blueprints/{id}/instances`
pub async fn create_instance(
    State(service): State<BlueprintService>,
    Path(id): Path<Uuid>,
    Json(request): Json<InstanceCreateRequest>,
) -> AppResult<(StatusCode, Json<InstanceRow>)> {
    let instance = service.create_instance(id, request).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// `GET /api/blueprint-instances/{id}`
///
/// Without `locale` both payloads come back as stored. With it, the
/// payload is resolved for that locale.
pub async fn get_instance(
    State(service): State<BlueprintService>,
    Path(id): Path<Uuid>,
    Query(query): Query<LocaleQuery>,
) -> AppResult<Json<InstanceView>> {
    let locale = query.locale.as_deref().map(|l| Locale::from_param(Some(l)));
    Ok(Json(service.get_instance(id, locale).await?))
}
