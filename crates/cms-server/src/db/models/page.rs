//! Page and block models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::content::{Locale, RenderedBlock};

/// Row of `cms.page`.
#[derive(Debug, Clone, FromRow)]
pub struct PageRow {
    pub id: Uuid,
    pub title_en: String,
    pub title_ar: String,
    pub slug_en: String,
    pub slug_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub meta_title_en: Option<String>,
    pub meta_title_ar: Option<String>,
    pub meta_description_en: Option<String>,
    pub meta_description_ar: Option<String>,
    pub keywords: Vec<String>,
    pub status: String,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of `cms.page_block`.
#[derive(Debug, Clone, FromRow)]
pub struct BlockRow {
    pub id: Uuid,
    pub page_id: Uuid,
    pub block_type: String,
    pub data: Value,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Publication state of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Draft => "draft",
            PageStatus::Published => "published",
        }
    }
}

/// English/Arabic pair as sent by the editor. Either side may be missing
/// so the service can report which one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BilingualInput {
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub ar: Option<String>,
}

/// English/Arabic pair in responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bilingual {
    pub en: String,
    pub ar: String,
}

impl Bilingual {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    fn from_options(en: Option<&str>, ar: Option<&str>) -> Self {
        Self::new(en.unwrap_or_default(), ar.unwrap_or_default())
    }
}

/// Block in a create or update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInput {
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub data: Option<Value>,

    /// Position on the page; defaults to the index in the request
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoInput {
    #[serde(default)]
    pub meta_title: Option<BilingualInput>,
    #[serde(default)]
    pub meta_description: Option<BilingualInput>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

/// Body of `POST /api/pages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageCreateRequest {
    #[serde(default)]
    pub title: BilingualInput,
    #[serde(default)]
    pub slug: BilingualInput,
    #[serde(default)]
    pub description: Option<BilingualInput>,
    #[serde(default)]
    pub blocks: Vec<BlockInput>,
    #[serde(default)]
    pub seo: Option<SeoInput>,
    #[serde(default)]
    pub status: Option<PageStatus>,
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Body of `PUT /api/pages/{id}`. Absent fields are left unchanged;
/// `blocks`, when present, replaces every block on the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageUpdateRequest {
    #[serde(default)]
    pub title: Option<BilingualInput>,
    #[serde(default)]
    pub slug: Option<BilingualInput>,
    #[serde(default)]
    pub description: Option<BilingualInput>,
    #[serde(default)]
    pub blocks: Option<Vec<BlockInput>>,
    #[serde(default)]
    pub seo: Option<SeoInput>,
    #[serde(default)]
    pub status: Option<PageStatus>,
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Column values for an insert, after validation.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub title: Bilingual,
    pub slug: Bilingual,
    pub description: (Option<String>, Option<String>),
    pub meta_title: (Option<String>, Option<String>),
    pub meta_description: (Option<String>, Option<String>),
    pub keywords: Vec<String>,
    pub status: PageStatus,
    pub featured: bool,
}

/// Block ready for insert, position already assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlock {
    pub block_type: String,
    pub data: Value,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub block_type: String,
    pub data: Value,
    pub order: i32,
}

impl From<BlockRow> for BlockResponse {
    fn from(row: BlockRow) -> Self {
        Self {
            id: row.id,
            block_type: row.block_type,
            data: row.data,
            order: row.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoResponse {
    pub meta_title: Bilingual,
    pub meta_description: Bilingual,
    pub keywords: Vec<String>,
}

/// Page in admin responses, both languages side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub id: Uuid,
    pub title: Bilingual,
    pub slug: Bilingual,
    pub description: Bilingual,
    pub blocks: Vec<BlockResponse>,
    pub seo: SeoResponse,
    pub status: String,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PageResponse {
    pub fn from_rows(page: PageRow, blocks: Vec<BlockRow>) -> Self {
        Self {
            id: page.id,
            title: Bilingual::new(page.title_en, page.title_ar),
            slug: Bilingual::new(page.slug_en, page.slug_ar),
            description: Bilingual::from_options(
                page.description_en.as_deref(),
                page.description_ar.as_deref(),
            ),
            blocks: blocks.into_iter().map(BlockResponse::from).collect(),
            seo: SeoResponse {
                meta_title: Bilingual::from_options(
                    page.meta_title_en.as_deref(),
                    page.meta_title_ar.as_deref(),
                ),
                meta_description: Bilingual::from_options(
                    page.meta_description_en.as_deref(),
                    page.meta_description_ar.as_deref(),
                ),
                keywords: page.keywords,
            },
            status: page.status,
            featured: page.featured,
            published_at: page.published_at,
            created_at: page.created_at,
            updated_at: page.updated_at,
        }
    }
}

/// Published page resolved for one locale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedPage {
    pub id: Uuid,
    pub locale: Locale,
    pub title: String,
    pub slug: String,
    /// Slug of the same page in the other language, for the switcher
    pub alternate_slug: String,
    pub description: Option<String>,
    pub meta_title: String,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub blocks: Vec<RenderedBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageListQuery {
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleQuery {
    #[serde(default)]
    pub locale: Option<String>,
}
