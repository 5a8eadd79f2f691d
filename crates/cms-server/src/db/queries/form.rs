//! Form submission queries.

use serde_json::Value;
use uuid::Uuid;

use crate::db::models::{ClientInfo, FormSubmissionRow};
use crate::db::DbPool;
use crate::error::AppResult;

pub async fn insert_submission(
    pool: &DbPool,
    form_id: &str,
    form_name: &str,
    data: &Value,
    locale: &str,
    client: &ClientInfo,
) -> AppResult<FormSubmissionRow> {
    let row = sqlx::query_as::<_, FormSubmissionRow>(
        r#"
        INSERT INTO cms.form_submission (id, form_id, form_name, data, locale, ip_address, user_agent, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'new')
        RETURNING id, form_id, form_name, data, locale, ip_address, user_agent, status, submitted_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(form_id)
    .bind(form_name)
    .bind(data)
    .bind(locale)
    .bind(&client.ip_address)
    .bind(&client.user_agent)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn list_submissions(
    pool: &DbPool,
    form_id: Option<&str>,
) -> AppResult<Vec<FormSubmissionRow>> {
    let rows = sqlx::query_as::<_, FormSubmissionRow>(
        r#"
        SELECT id, form_id, form_name, data, locale, ip_address, user_agent, status, submitted_at
        FROM cms.form_submission
        WHERE $1::TEXT IS NULL OR form_id = $1
        ORDER BY submitted_at DESC
        "#,
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
