//! Analytics property queries.

use uuid::Uuid;

use crate::db::models::PropertyRow;
use crate::db::DbPool;
use crate::error::AppResult;

pub async fn insert_property(
    pool: &DbPool,
    kind: &str,
    name: &str,
    external_id: &str,
    client_email: &str,
    credential: &[u8],
    is_active: bool,
) -> AppResult<PropertyRow> {
    let row = sqlx::query_as::<_, PropertyRow>(
        r#"
        INSERT INTO cms.analytics_property (id, kind, name, external_id, client_email, credential, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, kind, name, external_id, client_email, credential, is_active,
                  sync_status, sync_error_message, last_sync_at, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(kind)
    .bind(name)
    .bind(external_id)
    .bind(client_email)
    .bind(credential)
    .bind(is_active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_property(pool: &DbPool, id: Uuid) -> AppResult<Option<PropertyRow>> {
    let row = sqlx::query_as::<_, PropertyRow>(
        r#"
        SELECT id, kind, name, external_id, client_email, credential, is_active,
               sync_status, sync_error_message, last_sync_at, created_at, updated_at
        FROM cms.analytics_property
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn list_properties(pool: &DbPool, kind: &str) -> AppResult<Vec<PropertyRow>> {
    let rows = sqlx::query_as::<_, PropertyRow>(
        r#"
        SELECT id, kind, name, external_id, client_email, credential, is_active,
               sync_status, sync_error_message, last_sync_at, created_at, updated_at
        FROM cms.analytics_property
        WHERE kind = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(kind)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Active properties of every kind, in a stable order.
pub async fn list_active_properties(pool: &DbPool) -> AppResult<Vec<PropertyRow>> {
    let rows = sqlx::query_as::<_, PropertyRow>(
        r#"
        SELECT id, kind, name, external_id, client_email, credential, is_active,
               sync_status, sync_error_message, last_sync_at, created_at, updated_at
        FROM cms.analytics_property
        WHERE is_active
        ORDER BY kind ASC, created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn delete_property(pool: &DbPool, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM cms.analytics_property WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_sync_success(pool: &DbPool, id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE cms.analytics_property
        SET sync_status = 'success', sync_error_message = NULL,
            last_sync_at = NOW(), updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn mark_sync_error(pool: &DbPool, id: Uuid, message: &str) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE cms.analytics_property
        SET sync_status = 'error', sync_error_message = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}
