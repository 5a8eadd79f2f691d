//! Dynamic form handlers.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::db::models::{
    FormSubmissionRow, FormSubmitRequest, FormSubmitResponse, SubmissionListQuery,
};
use crate::error::AppResult;
use crate::services::form::client_info;
use crate::services::FormService;

/// `POST /api/form-submit`
///
/// ```json
/// { "formId": "<form instance id>", "formName": "Consultation", "data": { .. }, "locale": "en" }
/// ```
pub async fn submit(
    State(service): State<FormService>,
    headers: HeaderMap,
    Json(request): Json<FormSubmitRequest>,
) -> AppResult<Json<FormSubmitResponse>> {
    let client = client_info(&headers);
    Ok(Json(service.submit(request, client).await?))
}

/// `GET /api/form-submissions?form_id=..`
pub async fn list(
    State(service): State<FormService>,
    Query(query): Query<SubmissionListQuery>,
) -> AppResult<Json<Vec<FormSubmissionRow>>> {
    Ok(Json(service.list(query.form_id.as_deref()).await?))
}
