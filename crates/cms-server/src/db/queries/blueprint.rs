//! Blueprint and instance queries.

use serde_json::Value;
use uuid::Uuid;

use crate::db::models::{BlueprintRow, InstanceRow};
use crate::db::DbPool;
use crate::error::AppResult;

pub async fn insert_blueprint(
    pool: &DbPool,
    name: &str,
    description: Option<&str>,
    fields: &Value,
) -> AppResult<BlueprintRow> {
    let row = sqlx::query_as::<_, BlueprintRow>(
        r#"
        INSERT INTO cms.content_blueprint (id, name, description, fields)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, description, fields, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .bind(fields)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn list_blueprints(pool: &DbPool) -> AppResult<Vec<BlueprintRow>> {
    let rows = sqlx::query_as::<_, BlueprintRow>(
        r#"
        SELECT id, name, description, fields, created_at, updated_at
        FROM cms.content_blueprint
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_blueprint(pool: &DbPool, id: Uuid) -> AppResult<Option<BlueprintRow>> {
    let row = sqlx::query_as::<_, BlueprintRow>(
        r#"
        SELECT id, name, description, fields, created_at, updated_at
        FROM cms.content_blueprint
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn insert_instance(
    pool: &DbPool,
    blueprint_id: Uuid,
    name: &str,
    data_en: &Value,
    data_ar: &Value,
    status: &str,
) -> AppResult<InstanceRow> {
    let row = sqlx::query_as::<_, InstanceRow>(
        r#"
        INSERT INTO cms.blueprint_instance (id, blueprint_id, name, data_en, data_ar, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, blueprint_id, name, data_en, data_ar, status, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(blueprint_id)
    .bind(name)
    .bind(data_en)
    .bind(data_ar)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn list_instances(pool: &DbPool, blueprint_id: Uuid) -> AppResult<Vec<InstanceRow>> {
    let rows = sqlx::query_as::<_, InstanceRow>(
        r#"
        SELECT id, blueprint_id, name, data_en, data_ar, status, created_at, updated_at
        FROM cms.blueprint_instance
        WHERE blueprint_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(blueprint_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_instance(pool: &DbPool, id: Uuid) -> AppResult<Option<InstanceRow>> {
    let row = sqlx::query_as::<_, InstanceRow>(
        r#"
        SELECT id, blueprint_id, name, data_en, data_ar, status, created_at, updated_at
        FROM cms.blueprint_instance
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// An instance of the blueprint called `blueprint_name`.
pub async fn get_instance_of(
    pool: &DbPool,
    id: Uuid,
    blueprint_name: &str,
) -> AppResult<Option<InstanceRow>> {
    let row = sqlx::query_as::<_, InstanceRow>(
        r#"
        SELECT i.id, i.blueprint_id, i.name, i.data_en, i.data_ar, i.status,
               i.created_at, i.updated_at
        FROM cms.blueprint_instance i
        JOIN cms.content_blueprint b ON b.id = i.blueprint_id
        WHERE i.id = $1 AND b.name = $2
        "#,
    )
    .bind(id)
    .bind(blueprint_name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
