//! Lead and activity queries.

use uuid::Uuid;

use crate::db::models::{LeadActivityRow, LeadRow, LeadStatus, LeadUpdateRequest, NewLead};
use crate::db::DbPool;
use crate::error::AppResult;

pub async fn insert_lead(pool: &DbPool, lead: &NewLead) -> AppResult<LeadRow> {
    let row = sqlx::query_as::<_, LeadRow>(
        r#"
        INSERT INTO cms.lead (
            id, name, email, phone, company, project_type, budget, timeline, city, message,
            locale, source, status, qualified, score, notes, form_submission_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING id, name, email, phone, company, project_type, budget, timeline, city,
                  message, locale, source, status, qualified, score, notes,
                  form_submission_id, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&lead.name)
    .bind(&lead.email)
    .bind(&lead.phone)
    .bind(&lead.company)
    .bind(&lead.project_type)
    .bind(&lead.budget)
    .bind(&lead.timeline)
    .bind(&lead.city)
    .bind(&lead.message)
    .bind(&lead.locale)
    .bind(&lead.source)
    .bind(lead.status.as_str())
    .bind(lead.qualified)
    .bind(lead.score)
    .bind(&lead.notes)
    .bind(lead.form_submission_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_lead(pool: &DbPool, id: Uuid) -> AppResult<Option<LeadRow>> {
    let row = sqlx::query_as::<_, LeadRow>(
        r#"
        SELECT id, name, email, phone, company, project_type, budget, timeline, city,
               message, locale, source, status, qualified, score, notes,
               form_submission_id, created_at, updated_at
        FROM cms.lead
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn list_leads(pool: &DbPool, status: Option<LeadStatus>) -> AppResult<Vec<LeadRow>> {
    let rows = sqlx::query_as::<_, LeadRow>(
        r#"
        SELECT id, name, email, phone, company, project_type, budget, timeline, city,
               message, locale, source, status, qualified, score, notes,
               form_submission_id, created_at, updated_at
        FROM cms.lead
        WHERE $1::TEXT IS NULL OR status = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn update_lead(
    pool: &DbPool,
    id: Uuid,
    update: &LeadUpdateRequest,
) -> AppResult<Option<LeadRow>> {
    let row = sqlx::query_as::<_, LeadRow>(
        r#"
        UPDATE cms.lead SET
            status = COALESCE($2, status),
            score = COALESCE($3, score),
            qualified = COALESCE($4, qualified),
            notes = COALESCE($5, notes),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, email, phone, company, project_type, budget, timeline, city,
                  message, locale, source, status, qualified, score, notes,
                  form_submission_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.score)
    .bind(update.qualified)
    .bind(&update.notes)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn insert_activity(
    pool: &DbPool,
    lead_id: Uuid,
    kind: &str,
    description: &str,
) -> AppResult<LeadActivityRow> {
    let row = sqlx::query_as::<_, LeadActivityRow>(
        r#"
        INSERT INTO cms.lead_activity (id, lead_id, kind, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, lead_id, kind, description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(lead_id)
    .bind(kind)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Timeline of one lead, newest first.
pub async fn list_activities(pool: &DbPool, lead_id: Uuid) -> AppResult<Vec<LeadActivityRow>> {
    let rows = sqlx::query_as::<_, LeadActivityRow>(
        r#"
        SELECT id, lead_id, kind, description, created_at
        FROM cms.lead_activity
        WHERE lead_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(lead_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
