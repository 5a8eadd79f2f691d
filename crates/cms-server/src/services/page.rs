//! Page service: bilingual pages and their ordered blocks.

use std::collections::HashMap;

use uuid::Uuid;

use crate::content::{pick_text, render_block, Locale};
use crate::db::models::{
    Bilingual, BilingualInput, BlockInput, BlockRow, LocalizedPage, NewBlock, NewPage,
    PageCreateRequest, PageResponse, PageRow, PageStatus, PageUpdateRequest,
};
use crate::db::queries::page as queries;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::validation::{is_valid_slug, non_blank};

#[derive(Clone)]
pub struct PageService {
    pool: DbPool,
}

impl PageService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a page and its blocks in one transaction.
    pub async fn create(&self, request: PageCreateRequest) -> AppResult<PageResponse> {
        let page = build_new_page(&request)?;
        let blocks = assign_positions(&request.blocks)?;
        let id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;
        let row = queries::insert_page(&mut *tx, id, &page).await?;
        let mut block_rows = Vec::with_capacity(blocks.len());
        for block in &blocks {
            block_rows.push(queries::insert_block(&mut *tx, id, block).await?);
        }
        tx.commit().await?;

        block_rows.sort_by_key(|b| b.position);
        tracing::info!(page_id = %id, slug = %row.slug_en, blocks = block_rows.len(), "Page created");
        Ok(PageResponse::from_rows(row, block_rows))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PageResponse> {
        let page = queries::get_page(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Page {} not found", id)))?;
        let blocks = queries::list_blocks(&self.pool, id).await?;
        Ok(PageResponse::from_rows(page, blocks))
    }

    /// All pages, or only published ones when `published_only`.
    pub async fn list(&self, published_only: bool) -> AppResult<Vec<PageResponse>> {
        let status = published_only.then_some(PageStatus::Published);
        let pages = queries::list_pages(&self.pool, status).await?;
        let ids: Vec<Uuid> = pages.iter().map(|p| p.id).collect();

        let mut blocks_by_page: HashMap<Uuid, Vec<BlockRow>> = HashMap::new();
        for block in queries::list_blocks_for_pages(&self.pool, &ids).await? {
            blocks_by_page.entry(block.page_id).or_default().push(block);
        }

        Ok(pages
            .into_iter()
            .map(|page| {
                let blocks = blocks_by_page.remove(&page.id).unwrap_or_default();
                PageResponse::from_rows(page, blocks)
            })
            .collect())
    }

    /// Partial update. When `blocks` is given every existing block is
    /// replaced.
    pub async fn update(&self, id: Uuid, request: PageUpdateRequest) -> AppResult<PageResponse> {
        validate_update(&request)?;
        let blocks = request.blocks.as_deref().map(assign_positions).transpose()?;

        let mut tx = self.pool.begin().await?;
        let row = queries::update_page(&mut *tx, id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Page {} not found", id)))?;
        if let Some(blocks) = &blocks {
            let removed = queries::delete_blocks(&mut *tx, id).await?;
            for block in blocks {
                queries::insert_block(&mut *tx, id, block).await?;
            }
            tracing::debug!(page_id = %id, removed, added = blocks.len(), "Blocks replaced");
        }
        tx.commit().await?;

        let block_rows = queries::list_blocks(&self.pool, id).await?;
        Ok(PageResponse::from_rows(row, block_rows))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !queries::delete_page(&self.pool, id).await? {
            return Err(AppError::NotFound(format!("Page {} not found", id)));
        }
        tracing::info!(page_id = %id, "Page deleted");
        Ok(())
    }

    /// A published page by its slug in `locale`, resolved for that locale.
    pub async fn localized_by_slug(&self, slug: &str, locale: Locale) -> AppResult<LocalizedPage> {
        let page = queries::get_published_by_slug(&self.pool, slug, locale)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Page '{}' not found", slug)))?;
        let blocks = queries::list_blocks(&self.pool, page.id).await?;
        Ok(localize_page(page, &blocks, locale))
    }
}

fn required_pair(field: &str, input: &BilingualInput) -> AppResult<(String, String)> {
    match (non_blank(input.en.as_deref()), non_blank(input.ar.as_deref())) {
        (Some(en), Some(ar)) => Ok((en.to_string(), ar.to_string())),
        (None, _) => Err(AppError::BadRequest(format!("{} in English is required", field))),
        (_, None) => Err(AppError::BadRequest(format!("{} in Arabic is required", field))),
    }
}

fn check_slug(slug: &str) -> AppResult<()> {
    if !is_valid_slug(slug) {
        return Err(AppError::BadRequest(format!(
            "English slug '{}' may only contain lowercase letters, digits and dashes",
            slug
        )));
    }
    Ok(())
}

fn optional_pair(input: Option<&BilingualInput>) -> (Option<String>, Option<String>) {
    match input {
        Some(pair) => (
            non_blank(pair.en.as_deref()).map(str::to_string),
            non_blank(pair.ar.as_deref()).map(str::to_string),
        ),
        None => (None, None),
    }
}

/// Validate a create request into column values.
pub fn build_new_page(request: &PageCreateRequest) -> AppResult<NewPage> {
    let (title_en, title_ar) = required_pair("Title", &request.title)?;
    let (slug_en, slug_ar) = required_pair("Slug", &request.slug)?;
    check_slug(&slug_en)?;

    let seo = request.seo.clone().unwrap_or_default();
    Ok(NewPage {
        title: Bilingual::new(title_en, title_ar),
        slug: Bilingual::new(slug_en, slug_ar),
        description: optional_pair(request.description.as_ref()),
        meta_title: optional_pair(seo.meta_title.as_ref()),
        meta_description: optional_pair(seo.meta_description.as_ref()),
        keywords: clean_keywords(seo.keywords.unwrap_or_default()),
        status: request.status.unwrap_or_default(),
        featured: request.featured.unwrap_or(false),
    })
}

fn validate_update(request: &PageUpdateRequest) -> AppResult<()> {
    for (field, pair) in [("Title", &request.title), ("Slug", &request.slug)] {
        if let Some(pair) = pair {
            for value in [&pair.en, &pair.ar].into_iter().flatten() {
                if value.trim().is_empty() {
                    return Err(AppError::BadRequest(format!("{} cannot be blank", field)));
                }
            }
        }
    }
    if let Some(en) = request.slug.as_ref().and_then(|s| s.en.as_deref()) {
        check_slug(en)?;
    }
    Ok(())
}

fn clean_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Blocks in request order; `order` wins over the index when given.
pub fn assign_positions(blocks: &[BlockInput]) -> AppResult<Vec<NewBlock>> {
    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let block_type = block.block_type.trim();
            if block_type.is_empty() {
                return Err(AppError::BadRequest(format!("Block {} has no type", index)));
            }
            let position = match block.order {
                Some(order) => order,
                None => i32::try_from(index)
                    .map_err(|_| AppError::BadRequest("Too many blocks".to_string()))?,
            };
            Ok(NewBlock {
                block_type: block_type.to_string(),
                data: block.data.clone().unwrap_or_else(|| serde_json::json!({})),
                position,
            })
        })
        .collect()
}

/// Resolve a page and its blocks for one locale.
pub fn localize_page(page: PageRow, blocks: &[BlockRow], locale: Locale) -> LocalizedPage {
    let title = pick_text(Some(page.title_en.as_str()), Some(page.title_ar.as_str()), locale).unwrap_or_default();
    let (slug, alternate_slug) = match locale {
        Locale::En => (page.slug_en.clone(), page.slug_ar.clone()),
        Locale::Ar => (page.slug_ar.clone(), page.slug_en.clone()),
    };
    let description = pick_text(
        page.description_en.as_deref(),
        page.description_ar.as_deref(),
        locale,
    );
    let meta_title = pick_text(
        page.meta_title_en.as_deref(),
        page.meta_title_ar.as_deref(),
        locale,
    )
    .unwrap_or_else(|| title.clone());
    let meta_description = pick_text(
        page.meta_description_en.as_deref(),
        page.meta_description_ar.as_deref(),
        locale,
    )
    .or_else(|| description.clone());

    let mut ordered: Vec<&BlockRow> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.position);

    LocalizedPage {
        id: page.id,
        locale,
        title,
        slug,
        alternate_slug,
        description,
        meta_title,
        meta_description,
        keywords: page.keywords,
        featured: page.featured,
        published_at: page.published_at,
        blocks: ordered
            .into_iter()
            .map(|b| render_block(b.id, &b.block_type, b.position, &b.data, locale))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn pair(en: &str, ar: &str) -> BilingualInput {
        BilingualInput {
            en: Some(en.to_string()),
            ar: Some(ar.to_string()),
        }
    }

    fn create_request() -> PageCreateRequest {
        PageCreateRequest {
            title: pair("About Us", "من نحن"),
            slug: pair("about-us", "من-نحن"),
            ..PageCreateRequest::default()
        }
    }

    fn page_row() -> PageRow {
        PageRow {
            id: Uuid::nil(),
            title_en: "Services".into(),
            title_ar: "".into(),
            slug_en: "services".into(),
            slug_ar: "خدماتنا".into(),
            description_en: Some("What we do".into()),
            description_ar: None,
            meta_title_en: None,
            meta_title_ar: None,
            meta_description_en: None,
            meta_description_ar: None,
            keywords: vec!["interior".into()],
            status: "published".into(),
            featured: false,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn block(position: i32, block_type: &str, data: serde_json::Value) -> BlockRow {
        BlockRow {
            id: Uuid::new_v4(),
            page_id: Uuid::nil(),
            block_type: block_type.into(),
            data,
            position,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_new_page_requires_both_languages() {
        let page = build_new_page(&create_request()).unwrap();
        assert_eq!(page.slug.en, "about-us");
        assert_eq!(page.status, PageStatus::Draft);

        let mut missing_ar = create_request();
        missing_ar.title.ar = Some("  ".into());
        let err = build_new_page(&missing_ar).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("Arabic")));

        let mut missing_slug = create_request();
        missing_slug.slug.en = None;
        assert!(build_new_page(&missing_slug).is_err());
    }

    #[test]
    fn test_english_slug_pattern() {
        let mut request = create_request();
        request.slug.en = Some("About Us".into());
        assert!(matches!(build_new_page(&request), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_rejects_blank_and_bad_slug() {
        let blank = PageUpdateRequest {
            title: Some(BilingualInput {
                en: Some("".into()),
                ar: None,
            }),
            ..PageUpdateRequest::default()
        };
        assert!(validate_update(&blank).is_err());

        let bad_slug = PageUpdateRequest {
            slug: Some(BilingualInput {
                en: Some("Bad_Slug".into()),
                ar: None,
            }),
            ..PageUpdateRequest::default()
        };
        assert!(validate_update(&bad_slug).is_err());

        assert!(validate_update(&PageUpdateRequest::default()).is_ok());
    }

    #[test]
    fn test_positions_default_to_index() {
        let blocks = vec![
            BlockInput {
                block_type: "hero_banner".into(),
                data: None,
                order: None,
            },
            BlockInput {
                block_type: "faq".into(),
                data: Some(json!({"items": []})),
                order: Some(10),
            },
            BlockInput {
                block_type: "cta".into(),
                data: None,
                order: None,
            },
        ];
        let positions: Vec<i32> = assign_positions(&blocks)
            .unwrap()
            .iter()
            .map(|b| b.position)
            .collect();
        assert_eq!(positions, vec![0, 10, 2]);
    }

    #[test]
    fn test_block_without_type_rejected() {
        let blocks = vec![BlockInput {
            block_type: " ".into(),
            data: None,
            order: None,
        }];
        assert!(assign_positions(&blocks).is_err());
    }

    #[test]
    fn test_localize_page_falls_back_to_english() {
        let blocks = vec![
            block(2, "cta", json!({"titleEn": "Book now", "titleAr": ""})),
            block(1, "text", json!({"body": {"en": "Hello", "ar": "مرحبا"}})),
        ];
        let page = localize_page(page_row(), &blocks, Locale::Ar);

        assert_eq!(page.title, "Services");
        assert_eq!(page.slug, "خدماتنا");
        assert_eq!(page.alternate_slug, "services");
        assert_eq!(page.description.as_deref(), Some("What we do"));
        assert_eq!(page.meta_title, "Services");

        assert_eq!(page.blocks[0].order, 1);
        assert_eq!(page.blocks[0].data["body"], "مرحبا");
        assert_eq!(page.blocks[1].data["title"], "Book now");
    }
}
