//! Records produced by sync sources.
//!
//! Every record carries the natural key the vendor reports at, so storing
//! it with an upsert on that key makes re-syncing a window overwrite
//! instead of duplicate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The external analytics systems a property can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Ga4,
    Gsc,
    Gtm,
    Gbp,
    Youtube,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Ga4,
        SourceKind::Gsc,
        SourceKind::Gtm,
        SourceKind::Gbp,
        SourceKind::Youtube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Ga4 => "ga4",
            SourceKind::Gsc => "gsc",
            SourceKind::Gtm => "gtm",
            SourceKind::Gbp => "gbp",
            SourceKind::Youtube => "youtube",
        }
    }

    /// Human readable vendor name for logs and emails.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Ga4 => "Google Analytics 4",
            SourceKind::Gsc => "Search Console",
            SourceKind::Gtm => "Tag Manager",
            SourceKind::Gbp => "Business Profile",
            SourceKind::Youtube => "YouTube",
        }
    }

    /// Whether the source reports per-day data bounded by the sync window.
    pub fn is_windowed(&self) -> bool {
        matches!(self, SourceKind::Ga4 | SourceKind::Gsc | SourceKind::Youtube)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ga4" => Ok(SourceKind::Ga4),
            "gsc" | "search-console" => Ok(SourceKind::Gsc),
            "gtm" | "tag-manager" => Ok(SourceKind::Gtm),
            "gbp" | "business-profile" => Ok(SourceKind::Gbp),
            "youtube" => Ok(SourceKind::Youtube),
            other => Err(format!("unknown analytics source '{}'", other)),
        }
    }
}

/// GA4 daily totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ga4DailyMetrics {
    pub date: NaiveDate,
    pub active_users: i64,
    pub new_users: i64,
    pub sessions: i64,
    pub bounce_rate: f64,
    pub engagement_rate: f64,
    pub average_session_duration: f64,
    pub screen_page_views: i64,
    pub screen_page_views_per_session: f64,
    pub event_count: i64,
    pub conversions: i64,
    pub total_revenue: f64,
}

/// GA4 daily totals split by session source / medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ga4TrafficSource {
    pub date: NaiveDate,
    pub source_medium: String,
    pub source: String,
    pub medium: String,
    pub campaign: Option<String>,
    pub active_users: i64,
    pub new_users: i64,
    pub sessions: i64,
    pub bounce_rate: f64,
    pub engagement_rate: f64,
    pub conversions: i64,
    pub total_revenue: f64,
}

/// One dimension value with its active-user count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCount {
    pub name: String,
    pub count: i64,
}

/// GA4 realtime view of the last 30 minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ga4RealtimeSnapshot {
    pub captured_at: DateTime<Utc>,
    pub active_users: i64,
    pub screen_page_views: i64,
    pub event_count: i64,
    pub top_pages: Vec<DimensionCount>,
    pub top_sources: Vec<DimensionCount>,
    pub top_countries: Vec<DimensionCount>,
    pub top_devices: Vec<DimensionCount>,
}

/// Which Search Console breakdown a row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "value", rename_all = "lowercase")]
pub enum SearchDimension {
    Total,
    Query(String),
    Page(String),
}

/// Search Console clicks and impressions for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPerformance {
    pub date: NaiveDate,
    pub dimension: SearchDimension,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

/// Tag Manager container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtmContainer {
    pub container_id: String,
    pub name: String,
    pub public_id: Option<String>,
    pub usage_context: Vec<String>,
    pub domain_name: Vec<String>,
    pub notes: Option<String>,
}

/// The kinds of items synced out of a container workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GtmItemKind {
    Tag,
    Trigger,
    Variable,
}

impl GtmItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GtmItemKind::Tag => "tag",
            GtmItemKind::Trigger => "trigger",
            GtmItemKind::Variable => "variable",
        }
    }
}

/// A tag, trigger or variable in a container's workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtmItem {
    pub kind: GtmItemKind,
    pub container_id: String,
    pub item_id: String,
    pub name: String,
    pub item_type: String,
    /// Firing trigger ids (tags only).
    #[serde(default)]
    pub firing_trigger_ids: Vec<String>,
    #[serde(default)]
    pub paused: bool,
    pub notes: Option<String>,
    /// Vendor parameter / filter payload, kept as JSON.
    pub config: serde_json::Value,
}

/// A Business Profile review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessReview {
    pub review_id: String,
    pub reviewer_name: String,
    pub reviewer_photo_url: Option<String>,
    pub star_rating: i16,
    pub comment: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub reply_comment: Option<String>,
    pub reply_update_time: Option<DateTime<Utc>>,
}

/// YouTube channel analytics for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeDailyStats {
    pub date: NaiveDate,
    pub views: i64,
    pub estimated_minutes_watched: i64,
    pub average_view_duration: f64,
    pub subscribers_gained: i64,
    pub subscribers_lost: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub shares: i64,
    pub comments: i64,
}

/// Any record a source can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum SyncRecord {
    Ga4Daily(Ga4DailyMetrics),
    Ga4TrafficSource(Ga4TrafficSource),
    Ga4Realtime(Ga4RealtimeSnapshot),
    SearchPerformance(SearchPerformance),
    GtmContainer(GtmContainer),
    GtmItem(GtmItem),
    BusinessReview(BusinessReview),
    YoutubeDaily(YoutubeDailyStats),
}

/// The natural key a record is stored under, within one property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Ga4Daily(NaiveDate),
    Ga4TrafficSource(NaiveDate, String),
    /// Realtime snapshots are appended, never overwritten.
    Ga4Realtime(DateTime<Utc>),
    SearchTotal(NaiveDate),
    SearchQuery(NaiveDate, String),
    SearchPage(NaiveDate, String),
    GtmContainer(String),
    GtmItem(GtmItemKind, String, String),
    BusinessReview(String),
    YoutubeDaily(NaiveDate),
}

impl SyncRecord {
    pub fn key(&self) -> RecordKey {
        match self {
            SyncRecord::Ga4Daily(r) => RecordKey::Ga4Daily(r.date),
            SyncRecord::Ga4TrafficSource(r) => {
                RecordKey::Ga4TrafficSource(r.date, r.source_medium.clone())
            }
            SyncRecord::Ga4Realtime(r) => RecordKey::Ga4Realtime(r.captured_at),
            SyncRecord::SearchPerformance(r) => match &r.dimension {
                SearchDimension::Total => RecordKey::SearchTotal(r.date),
                SearchDimension::Query(q) => RecordKey::SearchQuery(r.date, q.clone()),
                SearchDimension::Page(p) => RecordKey::SearchPage(r.date, p.clone()),
            },
            SyncRecord::GtmContainer(r) => RecordKey::GtmContainer(r.container_id.clone()),
            SyncRecord::GtmItem(r) => {
                RecordKey::GtmItem(r.kind, r.container_id.clone(), r.item_id.clone())
            }
            SyncRecord::BusinessReview(r) => RecordKey::BusinessReview(r.review_id.clone()),
            SyncRecord::YoutubeDaily(r) => RecordKey::YoutubeDaily(r.date),
        }
    }

    /// The calendar day the record describes, if it is a per-day row.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            SyncRecord::Ga4Daily(r) => Some(r.date),
            SyncRecord::Ga4TrafficSource(r) => Some(r.date),
            SyncRecord::SearchPerformance(r) => Some(r.date),
            SyncRecord::YoutubeDaily(r) => Some(r.date),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn search(date: NaiveDate, dimension: SearchDimension) -> SyncRecord {
        SyncRecord::SearchPerformance(SearchPerformance {
            date,
            dimension,
            clicks: 1.0,
            impressions: 10.0,
            ctr: 0.1,
            position: 4.2,
        })
    }

    #[test]
    fn test_source_kind_parse_and_display() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
        assert_eq!("GA4".parse::<SourceKind>().unwrap(), SourceKind::Ga4);
        assert_eq!(
            "search-console".parse::<SourceKind>().unwrap(),
            SourceKind::Gsc
        );
        assert!("ads".parse::<SourceKind>().is_err());
        assert_eq!(SourceKind::Youtube.to_string(), "youtube");
    }

    #[test]
    fn test_search_keys_separate_dimensions() {
        let total = search(day(1), SearchDimension::Total).key();
        let query = search(day(1), SearchDimension::Query("sofa".into())).key();
        let page = search(day(1), SearchDimension::Page("/".into())).key();
        assert_ne!(total, query);
        assert_ne!(query, page);
        assert_eq!(
            query,
            search(day(1), SearchDimension::Query("sofa".into())).key()
        );
    }

    #[test]
    fn test_record_serializes_with_tag() {
        let value = serde_json::to_value(search(day(2), SearchDimension::Page("/a".into()))).unwrap();
        assert_eq!(value["record"], "search_performance");
        assert_eq!(value["dimension"]["dimension"], "page");
        assert_eq!(value["dimension"]["value"], "/a");
    }

    #[test]
    fn test_windowed_kinds() {
        assert!(SourceKind::Ga4.is_windowed());
        assert!(!SourceKind::Gtm.is_windowed());
        assert!(!SourceKind::Gbp.is_windowed());
    }
}
