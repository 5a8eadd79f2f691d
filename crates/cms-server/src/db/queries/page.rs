//! Page and block queries.

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::content::Locale;
use crate::db::models::{BlockRow, NewBlock, NewPage, PageRow, PageStatus, PageUpdateRequest};
use crate::db::DbPool;
use crate::error::AppResult;

/// Insert a page.
pub async fn insert_page<'e, E>(executor: E, id: Uuid, page: &NewPage) -> AppResult<PageRow>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, PageRow>(
        r#"
        INSERT INTO cms.page (
            id, title_en, title_ar, slug_en, slug_ar, description_en, description_ar,
            meta_title_en, meta_title_ar, meta_description_en, meta_description_ar,
            keywords, status, featured, published_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                CASE WHEN $13 = 'published' THEN NOW() END)
        RETURNING id, title_en, title_ar, slug_en, slug_ar, description_en, description_ar,
                  meta_title_en, meta_title_ar, meta_description_en, meta_description_ar,
                  keywords, status, featured, published_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&page.title.en)
    .bind(&page.title.ar)
    .bind(&page.slug.en)
    .bind(&page.slug.ar)
    .bind(&page.description.0)
    .bind(&page.description.1)
    .bind(&page.meta_title.0)
    .bind(&page.meta_title.1)
    .bind(&page.meta_description.0)
    .bind(&page.meta_description.1)
    .bind(&page.keywords)
    .bind(page.status.as_str())
    .bind(page.featured)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Apply a partial update. `None` leaves the column unchanged. The first
/// transition to `published` stamps `published_at`.
pub async fn update_page<'e, E>(
    executor: E,
    id: Uuid,
    update: &PageUpdateRequest,
) -> AppResult<Option<PageRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    let title = update.title.clone().unwrap_or_default();
    let slug = update.slug.clone().unwrap_or_default();
    let description = update.description.clone().unwrap_or_default();
    let seo = update.seo.clone().unwrap_or_default();
    let meta_title = seo.meta_title.unwrap_or_default();
    let meta_description = seo.meta_description.unwrap_or_default();

    let row = sqlx::query_as::<_, PageRow>(
        r#"
        UPDATE cms.page SET
            title_en = COALESCE($2, title_en),
            title_ar = COALESCE($3, title_ar),
            slug_en = COALESCE($4, slug_en),
            slug_ar = COALESCE($5, slug_ar),
            description_en = COALESCE($6, description_en),
            description_ar = COALESCE($7, description_ar),
            meta_title_en = COALESCE($8, meta_title_en),
            meta_title_ar = COALESCE($9, meta_title_ar),
            meta_description_en = COALESCE($10, meta_description_en),
            meta_description_ar = COALESCE($11, meta_description_ar),
            keywords = COALESCE($12, keywords),
            status = COALESCE($13, status),
            featured = COALESCE($14, featured),
            published_at = CASE
                WHEN $13 = 'published' AND published_at IS NULL THEN NOW()
                ELSE published_at
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, title_en, title_ar, slug_en, slug_ar, description_en, description_ar,
                  meta_title_en, meta_title_ar, meta_description_en, meta_description_ar,
                  keywords, status, featured, published_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(title.en)
    .bind(title.ar)
    .bind(slug.en)
    .bind(slug.ar)
    .bind(description.en)
    .bind(description.ar)
    .bind(meta_title.en)
    .bind(meta_title.ar)
    .bind(meta_description.en)
    .bind(meta_description.ar)
    .bind(seo.keywords)
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.featured)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn get_page(pool: &DbPool, id: Uuid) -> AppResult<Option<PageRow>> {
    let row = sqlx::query_as::<_, PageRow>(
        r#"
        SELECT id, title_en, title_ar, slug_en, slug_ar, description_en, description_ar,
               meta_title_en, meta_title_ar, meta_description_en, meta_description_ar,
               keywords, status, featured, published_at, created_at, updated_at
        FROM cms.page
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Find a published page by its slug in `locale`.
pub async fn get_published_by_slug(
    pool: &DbPool,
    slug: &str,
    locale: Locale,
) -> AppResult<Option<PageRow>> {
    let sql = match locale {
        Locale::En => {
            r#"
            SELECT id, title_en, title_ar, slug_en, slug_ar, description_en, description_ar,
                   meta_title_en, meta_title_ar, meta_description_en, meta_description_ar,
                   keywords, status, featured, published_at, created_at, updated_at
            FROM cms.page
            WHERE slug_en = $1 AND status = 'published'
            "#
        }
        Locale::Ar => {
            r#"
            SELECT id, title_en, title_ar, slug_en, slug_ar, description_en, description_ar,
                   meta_title_en, meta_title_ar, meta_description_en, meta_description_ar,
                   keywords, status, featured, published_at, created_at, updated_at
            FROM cms.page
            WHERE slug_ar = $1 AND status = 'published'
            "#
        }
    };

    let row = sqlx::query_as::<_, PageRow>(sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// List pages, newest first.
pub async fn list_pages(pool: &DbPool, status: Option<PageStatus>) -> AppResult<Vec<PageRow>> {
    let rows = sqlx::query_as::<_, PageRow>(
        r#"
        SELECT id, title_en, title_ar, slug_en, slug_ar, description_en, description_ar,
               meta_title_en, meta_title_ar, meta_description_en, meta_description_ar,
               keywords, status, featured, published_at, created_at, updated_at
        FROM cms.page
        WHERE $1::TEXT IS NULL OR status = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delete a page; its blocks go with it.
pub async fn delete_page(pool: &DbPool, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM cms.page WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_block<'e, E>(executor: E, page_id: Uuid, block: &NewBlock) -> AppResult<BlockRow>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, BlockRow>(
        r#"
        INSERT INTO cms.page_block (id, page_id, block_type, data, position)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, page_id, block_type, data, position, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(page_id)
    .bind(&block.block_type)
    .bind(&block.data)
    .bind(block.position)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn delete_blocks<'e, E>(executor: E, page_id: Uuid) -> AppResult<u64>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM cms.page_block WHERE page_id = $1")
        .bind(page_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Blocks of one page in render order.
pub async fn list_blocks(pool: &DbPool, page_id: Uuid) -> AppResult<Vec<BlockRow>> {
    let rows = sqlx::query_as::<_, BlockRow>(
        r#"
        SELECT id, page_id, block_type, data, position, created_at
        FROM cms.page_block
        WHERE page_id = $1
        ORDER BY position ASC, created_at ASC
        "#,
    )
    .bind(page_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Blocks of many pages at once, in render order per page.
pub async fn list_blocks_for_pages(pool: &DbPool, page_ids: &[Uuid]) -> AppResult<Vec<BlockRow>> {
    let rows = sqlx::query_as::<_, BlockRow>(
        r#"
        SELECT id, page_id, block_type, data, position, created_at
        FROM cms.page_block
        WHERE page_id = ANY($1)
        ORDER BY page_id, position ASC, created_at ASC
        "#,
    )
    .bind(page_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
