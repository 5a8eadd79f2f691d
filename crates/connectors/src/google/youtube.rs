//! YouTube channel analytics.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GoogleClient;
use crate::error::ConnectorError;
use crate::records::{SourceKind, SyncRecord, YoutubeDailyStats};
use crate::source::{verification_outcome, SyncSource};
use crate::window::{parse_iso_date, DateWindow};

const ANALYTICS_URL: &str = "https://youtubeanalytics.googleapis.com/v2/reports";
const CHANNELS_URL: &str = "https://www.googleapis.com/youtube/v3/channels";
const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/yt-analytics.readonly",
];

const DAILY_METRICS: &str = "views,estimatedMinutesWatched,averageViewDuration,subscribersGained,subscribersLost,likes,dislikes,shares,comments";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyticsReport {
    #[serde(default)]
    pub column_headers: Vec<ColumnHeader>,
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ColumnHeader {
    #[serde(default)]
    pub name: String,
}

/// Decode a `dimensions=day` report by column name. Rows without a valid
/// day are skipped.
pub(crate) fn parse_daily(report: &AnalyticsReport) -> Vec<YoutubeDailyStats> {
    let columns: HashMap<&str, usize> = report
        .column_headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.name.as_str(), i))
        .collect();

    let cell = |row: &[serde_json::Value], name: &str| -> Option<serde_json::Value> {
        columns.get(name).and_then(|&i| row.get(i)).cloned()
    };
    let number = |row: &[serde_json::Value], name: &str| -> f64 {
        match cell(row, name) {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    };

    report
        .rows
        .iter()
        .filter_map(|row| {
            let day = cell(row, "day");
            let raw_day = day.as_ref().and_then(|v| v.as_str()).unwrap_or_default();
            let Some(date) = parse_iso_date(raw_day) else {
                tracing::warn!(day = %raw_day, "skipping youtube row with bad day");
                return None;
            };
            Some(YoutubeDailyStats {
                date,
                views: number(row, "views") as i64,
                estimated_minutes_watched: number(row, "estimatedMinutesWatched") as i64,
                average_view_duration: number(row, "averageViewDuration"),
                subscribers_gained: number(row, "subscribersGained") as i64,
                subscribers_lost: number(row, "subscribersLost") as i64,
                likes: number(row, "likes") as i64,
                dislikes: number(row, "dislikes") as i64,
                shares: number(row, "shares") as i64,
                comments: number(row, "comments") as i64,
            })
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct ChannelList {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelItem {
    #[serde(default)]
    snippet: Option<ChannelSnippet>,
    #[serde(default)]
    statistics: Option<RawChannelStatistics>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
}

/// Current lifetime counters of a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelStatistics {
    pub title: String,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub view_count: i64,
}

/// Window summary over stored daily rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YoutubeSummary {
    pub total_views: i64,
    pub total_watch_hours: f64,
    pub subscriber_growth: i64,
    /// `(likes + comments) / views * 100`, 0 without views.
    pub engagement_rate: f64,
    /// Mean of the daily average view durations, in seconds.
    pub average_view_duration: f64,
    pub total_subscribers: Option<i64>,
    pub total_videos: Option<i64>,
}

pub fn summarize(days: &[YoutubeDailyStats], channel: Option<&ChannelStatistics>) -> YoutubeSummary {
    let total_views: i64 = days.iter().map(|d| d.views).sum();
    let minutes: i64 = days.iter().map(|d| d.estimated_minutes_watched).sum();
    let gained: i64 = days.iter().map(|d| d.subscribers_gained).sum();
    let lost: i64 = days.iter().map(|d| d.subscribers_lost).sum();
    let interactions: i64 = days.iter().map(|d| d.likes + d.comments).sum();

    YoutubeSummary {
        total_views,
        total_watch_hours: minutes as f64 / 60.0,
        subscriber_growth: gained - lost,
        engagement_rate: if total_views > 0 {
            interactions as f64 / total_views as f64 * 100.0
        } else {
            0.0
        },
        average_view_duration: if days.is_empty() {
            0.0
        } else {
            days.iter().map(|d| d.average_view_duration).sum::<f64>() / days.len() as f64
        },
        total_subscribers: channel.map(|c| c.subscriber_count),
        total_videos: channel.map(|c| c.video_count),
    }
}

/// One channel, addressed by its channel id.
pub struct YoutubeSource {
    client: GoogleClient,
    channel_id: String,
}

impl YoutubeSource {
    pub fn new(client: GoogleClient, channel_id: &str) -> Result<Self, ConnectorError> {
        let channel_id = channel_id.trim();
        if channel_id.is_empty() || channel_id.contains('/') || channel_id.contains(char::is_whitespace) {
            return Err(ConnectorError::Config(format!(
                "YouTube channel id is invalid: '{}'",
                channel_id
            )));
        }
        Ok(Self {
            client,
            channel_id: channel_id.to_string(),
        })
    }

    pub async fn daily_stats(
        &self,
        window: &DateWindow,
    ) -> Result<Vec<YoutubeDailyStats>, ConnectorError> {
        let query = [
            ("ids", format!("channel=={}", self.channel_id)),
            ("startDate", window.start_param()),
            ("endDate", window.end_param()),
            ("metrics", DAILY_METRICS.to_string()),
            ("dimensions", "day".to_string()),
            ("sort", "day".to_string()),
        ];
        let report: AnalyticsReport = self.client.get_json(ANALYTICS_URL, &query, SCOPES).await?;
        Ok(parse_daily(&report))
    }

    /// Lifetime counters, or `None` when the channel is not visible.
    pub async fn channel_statistics(&self) -> Result<Option<ChannelStatistics>, ConnectorError> {
        let query = [
            ("part", "snippet,statistics".to_string()),
            ("id", self.channel_id.clone()),
        ];
        let list: ChannelList = self.client.get_json(CHANNELS_URL, &query, SCOPES).await?;
        let Some(item) = list.items.into_iter().next() else {
            return Ok(None);
        };
        let stats = item.statistics.unwrap_or_default();
        let count = |v: Option<String>| v.and_then(|s| s.parse().ok()).unwrap_or(0);
        Ok(Some(ChannelStatistics {
            title: item.snippet.map(|s| s.title).unwrap_or_default(),
            subscriber_count: count(stats.subscriber_count),
            video_count: count(stats.video_count),
            view_count: count(stats.view_count),
        }))
    }
}

#[async_trait]
impl SyncSource for YoutubeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Youtube
    }

    async fn fetch_window(&self, window: &DateWindow) -> Result<Vec<SyncRecord>, ConnectorError> {
        let days = self.daily_stats(window).await?;
        tracing::debug!(channel = %self.channel_id, rows = days.len(), "fetched youtube daily stats");
        Ok(days.into_iter().map(SyncRecord::YoutubeDaily).collect())
    }

    async fn verify(&self) -> Result<bool, ConnectorError> {
        match self.channel_statistics().await {
            Ok(found) => Ok(found.is_some()),
            Err(e) => verification_outcome(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn day(d: u32, views: i64, likes: i64, comments: i64, avg: f64) -> YoutubeDailyStats {
        YoutubeDailyStats {
            date: NaiveDate::from_ymd_opt(2026, 8, d).unwrap(),
            views,
            estimated_minutes_watched: 90,
            average_view_duration: avg,
            subscribers_gained: 3,
            subscribers_lost: 1,
            likes,
            dislikes: 0,
            shares: 0,
            comments,
        }
    }

    #[test]
    fn test_parse_daily_by_column_name() {
        let report: AnalyticsReport = serde_json::from_value(json!({
            "columnHeaders": [
                { "name": "day" }, { "name": "views" }, { "name": "likes" },
                { "name": "averageViewDuration" }
            ],
            "rows": [
                ["2026-08-01", 250, 12, 41.5],
                ["bad", 1, 1, 1],
                ["2026-08-02", "30", 0, 0]
            ]
        }))
        .unwrap();
        let rows = parse_daily(&report);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].views, 250);
        assert_eq!(rows[0].likes, 12);
        assert_eq!(rows[0].average_view_duration, 41.5);
        assert_eq!(rows[0].shares, 0);
        assert_eq!(rows[1].views, 30);
    }

    #[test]
    fn test_summary() {
        let days = vec![day(1, 100, 8, 2, 40.0), day(2, 300, 10, 0, 60.0)];
        let channel = ChannelStatistics {
            title: "Studio".into(),
            subscriber_count: 1200,
            video_count: 48,
            view_count: 90_000,
        };
        let summary = summarize(&days, Some(&channel));
        assert_eq!(summary.total_views, 400);
        assert_eq!(summary.total_watch_hours, 3.0);
        assert_eq!(summary.subscriber_growth, 4);
        assert_eq!(summary.engagement_rate, 5.0);
        assert_eq!(summary.average_view_duration, 50.0);
        assert_eq!(summary.total_subscribers, Some(1200));
    }

    #[test]
    fn test_summary_without_views() {
        let summary = summarize(&[], None);
        assert_eq!(summary.engagement_rate, 0.0);
        assert_eq!(summary.average_view_duration, 0.0);
        assert_eq!(summary.total_videos, None);
    }
}
