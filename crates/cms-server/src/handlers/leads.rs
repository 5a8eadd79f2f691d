//! Lead API handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::db::models::{
    ActivityCreateRequest, LeadAccepted, LeadActivityRow, LeadDetail, LeadListQuery, LeadRow,
    LeadSubmission, LeadUpdateRequest,
};
use crate::error::AppResult;
use crate::rate_limit::client_ip;
use crate::services::LeadService;

/// `POST /api/leads`
///
/// Public capture endpoint, rate limited per client IP.
///
/// ```json
/// {
///   "name": "Sara",
///   "email": "sara@example.ae",
///   "phone": "+971 50 123 4567",
///   "projectType": "Villa Renovation",
///   "budget": "luxury",
///   "locale": "ar"
/// }
/// ```
pub async fn submit(
    State(service): State<LeadService>,
    headers: HeaderMap,
    Json(submission): Json<LeadSubmission>,
) -> AppResult<Json<LeadAccepted>> {
    let ip = client_ip(&headers);
    Ok(Json(service.submit(ip.as_deref(), submission).await?))
}

/// `GET /api/leads?status=new`
pub async fn list(
    State(service): State<LeadService>,
    Query(query): Query<LeadListQuery>,
) -> AppResult<Json<Vec<LeadRow>>> {
    Ok(Json(service.list(query.status).await?))
}

/// `GET /api/leads/{id}`
pub async fn get(
    State(service): State<LeadService>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LeadDetail>> {
    Ok(Json(service.get(id).await?))
}

/// `PATCH /api/leads/{id}`
pub async fn update(
    State(service): State<LeadService>,
    Path(id): Path<Uuid>,
    Json(request): Json<LeadUpdateRequest>,
) -> AppResult<Json<LeadRow>> {
    Ok(Json(service.update(id, request).await?))
}

/// `GET /api/leads/{id}/activities`
pub async fn list_activities(
    State(service): State<LeadService>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<LeadActivityRow>>> {
    Ok(Json(service.list_activities(id).await?))
}

/// `POST /api/leads/{id}/activities`
pub async fn add_activity(
    State(service): State<LeadService>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActivityCreateRequest>,
) -> AppResult<(StatusCode, Json<LeadActivityRow>)> {
    let activity = service.add_activity(id, request).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}
