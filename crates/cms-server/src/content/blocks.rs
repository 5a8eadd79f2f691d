//! Page block kinds and their localized view models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::locale::{localize, Locale};

/// Block type discriminator stored in `page_block.block_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    HeroBanner,
    Text,
    About,
    Stats,
    Services,
    Portfolio,
    Testimonials,
    Faq,
    Process,
    Gallery,
    Cta,
    Form,
    /// Unknown types are kept verbatim so the frontend can decide.
    Other(String),
}

impl BlockKind {
    /// Every known kind, in catalog order.
    pub const KNOWN: [BlockKind; 12] = [
        BlockKind::HeroBanner,
        BlockKind::Text,
        BlockKind::About,
        BlockKind::Stats,
        BlockKind::Services,
        BlockKind::Portfolio,
        BlockKind::Testimonials,
        BlockKind::Faq,
        BlockKind::Process,
        BlockKind::Gallery,
        BlockKind::Cta,
        BlockKind::Form,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::HeroBanner => "hero_banner",
            BlockKind::Text => "text",
            BlockKind::About => "about",
            BlockKind::Stats => "stats",
            BlockKind::Services => "services",
            BlockKind::Portfolio => "portfolio",
            BlockKind::Testimonials => "testimonials",
            BlockKind::Faq => "faq",
            BlockKind::Process => "process",
            BlockKind::Gallery => "gallery",
            BlockKind::Cta => "cta",
            BlockKind::Form => "form",
            BlockKind::Other(name) => name,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            BlockKind::HeroBanner => "Hero Banner",
            BlockKind::Text => "Rich Text",
            BlockKind::About => "About Section",
            BlockKind::Stats => "Statistics",
            BlockKind::Services => "Services Grid",
            BlockKind::Portfolio => "Portfolio Showcase",
            BlockKind::Testimonials => "Testimonials",
            BlockKind::Faq => "FAQ",
            BlockKind::Process => "Process Steps",
            BlockKind::Gallery => "Image Gallery",
            BlockKind::Cta => "Call to Action",
            BlockKind::Form => "Form",
            BlockKind::Other(name) => name,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            BlockKind::HeroBanner => "headers",
            BlockKind::Text | BlockKind::About | BlockKind::Process => "content",
            BlockKind::Stats | BlockKind::Testimonials => "social_proof",
            BlockKind::Services | BlockKind::Portfolio | BlockKind::Gallery => "showcase",
            BlockKind::Faq => "support",
            BlockKind::Cta | BlockKind::Form => "conversion",
            BlockKind::Other(_) => "custom",
        }
    }

    /// Field names the editor must fill for the block to render.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            BlockKind::HeroBanner => &["title"],
            BlockKind::Text => &["content"],
            BlockKind::About => &["title", "description"],
            BlockKind::Stats => &["items"],
            BlockKind::Services => &["items"],
            BlockKind::Portfolio => &["projects"],
            BlockKind::Testimonials => &["items"],
            BlockKind::Faq => &["items"],
            BlockKind::Process => &["steps"],
            BlockKind::Gallery => &["images"],
            BlockKind::Cta => &["title", "buttonText", "buttonLink"],
            BlockKind::Form => &["formId"],
            BlockKind::Other(_) => &[],
        }
    }

    /// Name of the list field a kind renders as repeated items, if any.
    fn collection_field(&self) -> Option<&'static str> {
        match self {
            BlockKind::Stats
            | BlockKind::Services
            | BlockKind::Testimonials
            | BlockKind::Faq => Some("items"),
            BlockKind::Portfolio => Some("projects"),
            BlockKind::Process => Some("steps"),
            BlockKind::Gallery => Some("images"),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "hero_banner" | "hero" => BlockKind::HeroBanner,
            "text" | "rich_text" => BlockKind::Text,
            "about" | "about_section" => BlockKind::About,
            "stats" | "stats_banner" => BlockKind::Stats,
            "services" | "services_grid" => BlockKind::Services,
            "portfolio" | "featured_projects" => BlockKind::Portfolio,
            "testimonials" => BlockKind::Testimonials,
            "faq" => BlockKind::Faq,
            "process" => BlockKind::Process,
            "gallery" => BlockKind::Gallery,
            "cta" | "call_to_action" => BlockKind::Cta,
            "form" | "contact_form" => BlockKind::Form,
            other => BlockKind::Other(other.to_string()),
        })
    }
}

impl From<&str> for BlockKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl Serialize for BlockKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(BlockKind::from(raw.as_str()))
    }
}

/// Entry in the block catalog served to the page editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTypeInfo {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub display_name: String,
    pub category: &'static str,
    pub required_fields: &'static [&'static str],
}

pub fn block_catalog() -> Vec<BlockTypeInfo> {
    BlockKind::KNOWN
        .iter()
        .map(|kind| BlockTypeInfo {
            kind: kind.clone(),
            display_name: kind.display_name().to_string(),
            category: kind.category(),
            required_fields: kind.required_fields(),
        })
        .collect()
}

/// A block resolved for one locale, ready for the matching component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBlock {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub order: i32,
    pub data: Value,
    /// Required fields that resolved to nothing for this locale
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<&'static str>,
}

/// Resolve one stored block for a locale.
///
/// Repeated items (FAQ entries, stats, steps) are ordered by their own
/// `order` field when present.
pub fn render_block(id: Uuid, block_type: &str, position: i32, data: &Value, locale: Locale) -> RenderedBlock {
    let kind = BlockKind::from(block_type);
    let mut data = localize(data, locale);

    if let Some(field) = kind.collection_field() {
        if let Some(Value::Array(items)) = data.get_mut(field) {
            items.sort_by_key(|item| item.get("order").and_then(Value::as_i64).unwrap_or(i64::MAX));
        }
    }

    let missing_fields = kind
        .required_fields()
        .iter()
        .copied()
        .filter(|field| is_empty_field(data.get(*field)))
        .collect();

    RenderedBlock {
        id,
        kind,
        order: position,
        data,
        missing_fields,
    }
}

fn is_empty_field(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}
