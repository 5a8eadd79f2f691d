//! Google Analytics 4 via the Data API.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::GoogleClient;
use crate::error::ConnectorError;
use crate::records::{
    DimensionCount, Ga4DailyMetrics, Ga4RealtimeSnapshot, Ga4TrafficSource, SourceKind,
    SyncRecord,
};
use crate::source::{verification_outcome, SyncSource};
use crate::window::{parse_compact_date, DateWindow};

const BASE_URL: &str = "https://analyticsdata.googleapis.com/v1beta";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/analytics.readonly"];
const REALTIME_TOP_N: u32 = 10;

const DAILY_METRICS: [&str; 10] = [
    "activeUsers",
    "newUsers",
    "sessions",
    "bounceRate",
    "engagementRate",
    "averageSessionDuration",
    "screenPageViews",
    "eventCount",
    "conversions",
    "totalRevenue",
];

const TRAFFIC_METRICS: [&str; 7] = [
    "activeUsers",
    "newUsers",
    "sessions",
    "bounceRate",
    "engagementRate",
    "conversions",
    "totalRevenue",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportResponse {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportValue {
    #[serde(default)]
    pub value: Option<String>,
}

impl ReportRow {
    fn dimension(&self, index: usize) -> Option<&str> {
        self.dimension_values
            .get(index)
            .and_then(|v| v.value.as_deref())
            .filter(|v| !v.is_empty())
    }

    fn int(&self, index: usize) -> i64 {
        self.metric_values
            .get(index)
            .and_then(|v| v.value.as_deref())
            .and_then(|v| v.parse::<f64>().ok())
            .map(|v| v as i64)
            .unwrap_or(0)
    }

    fn float(&self, index: usize) -> f64 {
        self.metric_values
            .get(index)
            .and_then(|v| v.value.as_deref())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    }
}

/// Decode a `date`-dimension report. Malformed dates fall back to `today`.
pub(crate) fn parse_daily(report: &ReportResponse, today: NaiveDate) -> Vec<Ga4DailyMetrics> {
    report
        .rows
        .iter()
        .map(|row| {
            let sessions = row.int(2);
            let screen_page_views = row.int(6);
            Ga4DailyMetrics {
                date: parse_compact_date(row.dimension(0).unwrap_or_default(), today),
                active_users: row.int(0),
                new_users: row.int(1),
                sessions,
                bounce_rate: row.float(3),
                engagement_rate: row.float(4),
                average_session_duration: row.float(5),
                screen_page_views,
                screen_page_views_per_session: if sessions > 0 {
                    screen_page_views as f64 / sessions as f64
                } else {
                    0.0
                },
                event_count: row.int(7),
                conversions: row.int(8),
                total_revenue: row.float(9),
            }
        })
        .collect()
}

/// Decode a date/source/medium/campaign report.
pub(crate) fn parse_traffic(report: &ReportResponse, today: NaiveDate) -> Vec<Ga4TrafficSource> {
    report
        .rows
        .iter()
        .map(|row| {
            let source = row.dimension(1).unwrap_or("unknown").to_string();
            let medium = row.dimension(2).unwrap_or("unknown").to_string();
            Ga4TrafficSource {
                date: parse_compact_date(row.dimension(0).unwrap_or_default(), today),
                source_medium: format!("{} / {}", source, medium),
                source,
                medium,
                campaign: row.dimension(3).map(str::to_string),
                active_users: row.int(0),
                new_users: row.int(1),
                sessions: row.int(2),
                bounce_rate: row.float(3),
                engagement_rate: row.float(4),
                conversions: row.int(5),
                total_revenue: row.float(6),
            }
        })
        .collect()
}

fn parse_top(report: &ReportResponse) -> Vec<DimensionCount> {
    report
        .rows
        .iter()
        .map(|row| DimensionCount {
            name: row.dimension(0).unwrap_or("unknown").to_string(),
            count: row.int(0),
        })
        .collect()
}

/// One GA4 property, addressed by its numeric id.
pub struct Ga4Source {
    client: GoogleClient,
    property_id: String,
}

impl Ga4Source {
    pub fn new(client: GoogleClient, property_id: &str) -> Result<Self, ConnectorError> {
        let id = property_id.trim().trim_start_matches("properties/");
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConnectorError::Config(format!(
                "GA4 property id must be numeric, got '{}'",
                property_id
            )));
        }
        Ok(Self {
            client,
            property_id: id.to_string(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/properties/{}:{}", BASE_URL, self.property_id, method)
    }

    async fn run_report(&self, body: serde_json::Value) -> Result<ReportResponse, ConnectorError> {
        self.client.post_json(&self.url("runReport"), &body, SCOPES).await
    }

    async fn run_realtime(&self, body: serde_json::Value) -> Result<ReportResponse, ConnectorError> {
        self.client
            .post_json(&self.url("runRealtimeReport"), &body, SCOPES)
            .await
    }

    pub async fn daily_metrics(
        &self,
        window: &DateWindow,
    ) -> Result<Vec<Ga4DailyMetrics>, ConnectorError> {
        let report = self
            .run_report(json!({
                "dateRanges": [{ "startDate": window.start_param(), "endDate": window.end_param() }],
                "dimensions": [{ "name": "date" }],
                "metrics": metric_list(&DAILY_METRICS),
            }))
            .await?;
        Ok(parse_daily(&report, window.end))
    }

    pub async fn traffic_sources(
        &self,
        window: &DateWindow,
    ) -> Result<Vec<Ga4TrafficSource>, ConnectorError> {
        let report = self
            .run_report(json!({
                "dateRanges": [{ "startDate": window.start_param(), "endDate": window.end_param() }],
                "dimensions": [
                    { "name": "date" },
                    { "name": "sessionSource" },
                    { "name": "sessionMedium" },
                    { "name": "sessionCampaignName" },
                ],
                "metrics": metric_list(&TRAFFIC_METRICS),
            }))
            .await?;
        Ok(parse_traffic(&report, window.end))
    }

    /// Activity over the last 30 minutes.
    pub async fn realtime(&self) -> Result<Ga4RealtimeSnapshot, ConnectorError> {
        let totals = self
            .run_realtime(json!({
                "metrics": metric_list(&["activeUsers", "screenPageViews", "eventCount"]),
            }))
            .await?;

        let mut tops = Vec::with_capacity(4);
        for dimension in ["unifiedScreenName", "sessionSource", "country", "deviceCategory"] {
            let report = self
                .run_realtime(json!({
                    "dimensions": [{ "name": dimension }],
                    "metrics": [{ "name": "activeUsers" }],
                    "limit": REALTIME_TOP_N,
                }))
                .await?;
            tops.push(parse_top(&report));
        }
        let mut tops = tops.into_iter();

        let first = totals.rows.first();
        Ok(Ga4RealtimeSnapshot {
            captured_at: Utc::now(),
            active_users: first.map(|r| r.int(0)).unwrap_or(0),
            screen_page_views: first.map(|r| r.int(1)).unwrap_or(0),
            event_count: first.map(|r| r.int(2)).unwrap_or(0),
            top_pages: tops.next().unwrap_or_default(),
            top_sources: tops.next().unwrap_or_default(),
            top_countries: tops.next().unwrap_or_default(),
            top_devices: tops.next().unwrap_or_default(),
        })
    }
}

fn metric_list(names: &[&str]) -> serde_json::Value {
    serde_json::Value::Array(names.iter().map(|n| json!({ "name": n })).collect())
}

#[async_trait]
impl SyncSource for Ga4Source {
    fn kind(&self) -> SourceKind {
        SourceKind::Ga4
    }

    async fn fetch_window(&self, window: &DateWindow) -> Result<Vec<SyncRecord>, ConnectorError> {
        let daily = self.daily_metrics(window).await?;
        tracing::debug!(property = %self.property_id, rows = daily.len(), "fetched GA4 daily metrics");

        let traffic = self.traffic_sources(window).await?;
        tracing::debug!(property = %self.property_id, rows = traffic.len(), "fetched GA4 traffic sources");

        let mut records: Vec<SyncRecord> = daily
            .into_iter()
            .map(SyncRecord::Ga4Daily)
            .chain(traffic.into_iter().map(SyncRecord::Ga4TrafficSource))
            .collect();

        match self.realtime().await {
            Ok(snapshot) => records.push(SyncRecord::Ga4Realtime(snapshot)),
            Err(e) => tracing::warn!(
                property = %self.property_id,
                error = %e,
                "GA4 realtime fetch failed, continuing without it"
            ),
        }

        Ok(records)
    }

    async fn verify(&self) -> Result<bool, ConnectorError> {
        let result = self
            .run_report(json!({
                "dateRanges": [{ "startDate": "7daysAgo", "endDate": "today" }],
                "dimensions": [{ "name": "date" }],
                "metrics": [{ "name": "activeUsers" }],
                "limit": 1,
            }))
            .await
            .map(|_| ());
        verification_outcome(result)
    }
}
