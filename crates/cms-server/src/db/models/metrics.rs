//! Stored analytics rows and the metrics read model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use studio_connectors::google::business_profile::ReviewStats;
use studio_connectors::google::search_console::SearchInsights;
use studio_connectors::google::youtube::YoutubeSummary;
use studio_connectors::records::{
    BusinessReview, SearchDimension, SearchPerformance, YoutubeDailyStats,
};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ga4DailyRow {
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

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ga4TrafficRow {
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

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ga4RealtimeRow {
    pub captured_at: DateTime<Utc>,
    pub active_users: i64,
    pub screen_page_views: i64,
    pub event_count: i64,
    pub top_pages: Value,
    pub top_sources: Value,
    pub top_countries: Value,
    pub top_devices: Value,
}

/// Window totals over GA4 daily rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ga4Totals {
    pub active_users: i64,
    pub new_users: i64,
    pub sessions: i64,
    pub screen_page_views: i64,
    pub conversions: i64,
    pub total_revenue: f64,
    /// Session-weighted mean
    pub bounce_rate: f64,
    /// Session-weighted mean
    pub engagement_rate: f64,
}

impl Ga4Totals {
    pub fn from_days(days: &[Ga4DailyRow]) -> Self {
        let mut totals = Ga4Totals::default();
        let mut weighted_bounce = 0.0;
        let mut weighted_engagement = 0.0;

        for day in days {
            totals.active_users += day.active_users;
            totals.new_users += day.new_users;
            totals.sessions += day.sessions;
            totals.screen_page_views += day.screen_page_views;
            totals.conversions += day.conversions;
            totals.total_revenue += day.total_revenue;
            weighted_bounce += day.bounce_rate * day.sessions as f64;
            weighted_engagement += day.engagement_rate * day.sessions as f64;
        }

        if totals.sessions > 0 {
            totals.bounce_rate = weighted_bounce / totals.sessions as f64;
            totals.engagement_rate = weighted_engagement / totals.sessions as f64;
        }
        totals
    }
}

/// A Search Console row from any of the three tables. `dimension` is
/// `total`, `query` or `page`; `value` is empty for totals.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SearchRow {
    pub date: NaiveDate,
    pub dimension: String,
    pub value: String,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

impl From<&SearchRow> for SearchPerformance {
    fn from(row: &SearchRow) -> Self {
        let dimension = match row.dimension.as_str() {
            "query" => SearchDimension::Query(row.value.clone()),
            "page" => SearchDimension::Page(row.value.clone()),
            _ => SearchDimension::Total,
        };
        SearchPerformance {
            date: row.date,
            dimension,
            clicks: row.clicks,
            impressions: row.impressions,
            ctr: row.ctr,
            position: row.position,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GtmContainerRow {
    pub container_id: String,
    pub name: String,
    pub public_id: Option<String>,
    pub usage_context: Vec<String>,
    pub domain_name: Vec<String>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Tag, trigger or variable. `item_type` is the vendor type string.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GtmItemRow {
    pub container_id: String,
    pub item_id: String,
    pub name: String,
    pub item_type: String,
    pub firing_trigger_ids: Vec<String>,
    pub paused: bool,
    pub notes: Option<String>,
    pub config: Option<Value>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewRow {
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

impl From<&ReviewRow> for BusinessReview {
    fn from(row: &ReviewRow) -> Self {
        BusinessReview {
            review_id: row.review_id.clone(),
            reviewer_name: row.reviewer_name.clone(),
            reviewer_photo_url: row.reviewer_photo_url.clone(),
            star_rating: row.star_rating,
            comment: row.comment.clone(),
            create_time: row.create_time,
            update_time: row.update_time,
            reply_comment: row.reply_comment.clone(),
            reply_update_time: row.reply_update_time,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct YoutubeDailyRow {
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

impl From<&YoutubeDailyRow> for YoutubeDailyStats {
    fn from(row: &YoutubeDailyRow) -> Self {
        YoutubeDailyStats {
            date: row.date,
            views: row.views,
            estimated_minutes_watched: row.estimated_minutes_watched,
            average_view_duration: row.average_view_duration,
            subscribers_gained: row.subscribers_gained,
            subscribers_lost: row.subscribers_lost,
            likes: row.likes,
            dislikes: row.dislikes,
            shares: row.shares,
            comments: row.comments,
        }
    }
}

/// Stored rows for one property and window, with the derived summary.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PropertyMetrics {
    Ga4 {
        totals: Ga4Totals,
        daily: Vec<Ga4DailyRow>,
        traffic_sources: Vec<Ga4TrafficRow>,
        latest_realtime: Option<Ga4RealtimeRow>,
    },
    Gsc {
        insights: SearchInsights,
        rows: Vec<SearchRow>,
    },
    Gtm {
        containers: Vec<GtmContainerRow>,
        tags: Vec<GtmItemRow>,
        triggers: Vec<GtmItemRow>,
        variables: Vec<GtmItemRow>,
    },
    Gbp {
        stats: ReviewStats,
        reviews: Vec<ReviewRow>,
    },
    Youtube {
        summary: YoutubeSummary,
        daily: Vec<YoutubeDailyRow>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, sessions: i64, bounce_rate: f64) -> Ga4DailyRow {
        Ga4DailyRow {
            date: NaiveDate::from_ymd_opt(2026, 9, d).unwrap(),
            active_users: 10,
            new_users: 4,
            sessions,
            bounce_rate,
            engagement_rate: 1.0 - bounce_rate,
            average_session_duration: 60.0,
            screen_page_views: sessions * 2,
            screen_page_views_per_session: 2.0,
            event_count: 50,
            conversions: 1,
            total_revenue: 0.0,
        }
    }

    #[test]
    fn test_ga4_totals_weight_rates_by_sessions() {
        let totals = Ga4Totals::from_days(&[day(1, 30, 0.5), day(2, 10, 0.1)]);
        assert_eq!(totals.sessions, 40);
        assert_eq!(totals.active_users, 20);
        assert_eq!(totals.screen_page_views, 80);
        assert!((totals.bounce_rate - 0.4).abs() < 1e-9);
        assert!((totals.engagement_rate - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_ga4_totals_empty() {
        assert_eq!(Ga4Totals::from_days(&[]), Ga4Totals::default());
    }

    #[test]
    fn test_search_row_dimension() {
        let row = SearchRow {
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            dimension: "query".into(),
            value: "villa interior design".into(),
            clicks: 3.0,
            impressions: 40.0,
            ctr: 0.075,
            position: 6.1,
        };
        let perf = SearchPerformance::from(&row);
        assert_eq!(perf.dimension, SearchDimension::Query("villa interior design".into()));
    }
}
