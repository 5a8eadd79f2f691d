//! Google Search Console search analytics.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::GoogleClient;
use crate::error::ConnectorError;
use crate::records::{SearchDimension, SearchPerformance, SourceKind, SyncRecord};
use crate::source::{verification_outcome, SyncSource};
use crate::window::{parse_iso_date, DateWindow};

const BASE_URL: &str = "https://searchconsole.googleapis.com/webmasters/v3";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/webmasters.readonly"];

/// Row limit for the per-day totals report.
pub const DATE_ROW_LIMIT: u32 = 25_000;
/// Row limit for the query and page breakdowns.
pub const DIMENSION_ROW_LIMIT: u32 = 1_000;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub rows: Vec<QueryRow>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Breakdown {
    Date,
    Query,
    Page,
}

impl Breakdown {
    fn dimensions(&self) -> &'static [&'static str] {
        match self {
            Breakdown::Date => &["date"],
            Breakdown::Query => &["date", "query"],
            Breakdown::Page => &["date", "page"],
        }
    }

    fn row_limit(&self) -> u32 {
        match self {
            Breakdown::Date => DATE_ROW_LIMIT,
            _ => DIMENSION_ROW_LIMIT,
        }
    }
}

/// Decode a search analytics response. Rows with an unparseable date key
/// are skipped.
pub(crate) fn parse_rows(response: &QueryResponse, breakdown: Breakdown) -> Vec<SearchPerformance> {
    response
        .rows
        .iter()
        .filter_map(|row| {
            let raw_date = row.keys.first().map(String::as_str).unwrap_or_default();
            let Some(date) = parse_iso_date(raw_date) else {
                tracing::warn!(date = %raw_date, "skipping search console row with bad date");
                return None;
            };
            let second = row.keys.get(1).cloned().unwrap_or_default();
            let dimension = match breakdown {
                Breakdown::Date => SearchDimension::Total,
                Breakdown::Query => SearchDimension::Query(second),
                Breakdown::Page => SearchDimension::Page(second),
            };
            Some(SearchPerformance {
                date,
                dimension,
                clicks: row.clicks,
                impressions: row.impressions,
                ctr: row.ctr,
                position: row.position,
            })
        })
        .collect()
}

/// Clicks and impressions for one query or page over a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopEntry {
    pub name: String,
    pub clicks: f64,
    pub impressions: f64,
}

/// Totals and leaders over a set of stored rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchInsights {
    pub total_clicks: f64,
    pub total_impressions: f64,
    pub average_ctr: f64,
    pub average_position: f64,
    pub top_queries: Vec<TopEntry>,
    pub top_pages: Vec<TopEntry>,
}

/// Summarize rows of every dimension into insights.
///
/// Totals and averages come from the per-day rows; leaders are the
/// query and page rows summed across days and ranked by clicks.
pub fn insights(rows: &[SearchPerformance], top_n: usize) -> SearchInsights {
    let totals: Vec<&SearchPerformance> = rows
        .iter()
        .filter(|r| r.dimension == SearchDimension::Total)
        .collect();

    let total_clicks: f64 = totals.iter().map(|r| r.clicks).sum();
    let total_impressions: f64 = totals.iter().map(|r| r.impressions).sum();
    let average_ctr = if total_impressions > 0.0 {
        total_clicks / total_impressions
    } else {
        0.0
    };
    let average_position = if totals.is_empty() {
        0.0
    } else {
        totals.iter().map(|r| r.position).sum::<f64>() / totals.len() as f64
    };

    let mut queries: HashMap<&str, (f64, f64)> = HashMap::new();
    let mut pages: HashMap<&str, (f64, f64)> = HashMap::new();
    for row in rows {
        let bucket = match &row.dimension {
            SearchDimension::Query(q) => queries.entry(q.as_str()),
            SearchDimension::Page(p) => pages.entry(p.as_str()),
            SearchDimension::Total => continue,
        };
        let entry = bucket.or_insert((0.0, 0.0));
        entry.0 += row.clicks;
        entry.1 += row.impressions;
    }

    SearchInsights {
        total_clicks,
        total_impressions,
        average_ctr,
        average_position,
        top_queries: rank(queries, top_n),
        top_pages: rank(pages, top_n),
    }
}

fn rank(buckets: HashMap<&str, (f64, f64)>, top_n: usize) -> Vec<TopEntry> {
    let mut entries: Vec<TopEntry> = buckets
        .into_iter()
        .map(|(name, (clicks, impressions))| TopEntry {
            name: name.to_string(),
            clicks,
            impressions,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.clicks
            .total_cmp(&a.clicks)
            .then(b.impressions.total_cmp(&a.impressions))
            .then_with(|| a.name.cmp(&b.name))
    });
    entries.truncate(top_n);
    entries
}

/// One verified Search Console site (`https://example.com/` or
/// `sc-domain:example.com`).
pub struct SearchConsoleSource {
    client: GoogleClient,
    site_url: String,
}

impl SearchConsoleSource {
    pub fn new(client: GoogleClient, site_url: &str) -> Result<Self, ConnectorError> {
        let site_url = site_url.trim();
        if !(site_url.starts_with("http://")
            || site_url.starts_with("https://")
            || site_url.starts_with("sc-domain:"))
        {
            return Err(ConnectorError::Config(format!(
                "Search Console site must be a URL or sc-domain property, got '{}'",
                site_url
            )));
        }
        Ok(Self {
            client,
            site_url: site_url.to_string(),
        })
    }

    fn site_path(&self) -> String {
        format!("{}/sites/{}", BASE_URL, urlencoding::encode(&self.site_url))
    }

    pub(crate) async fn query(
        &self,
        window: &DateWindow,
        breakdown: Breakdown,
    ) -> Result<Vec<SearchPerformance>, ConnectorError> {
        let url = format!("{}/searchAnalytics/query", self.site_path());
        let body = json!({
            "startDate": window.start_param(),
            "endDate": window.end_param(),
            "dimensions": breakdown.dimensions(),
            "rowLimit": breakdown.row_limit(),
        });
        let response: QueryResponse = self.client.post_json(&url, &body, SCOPES).await?;
        Ok(parse_rows(&response, breakdown))
    }
}

#[async_trait]
impl SyncSource for SearchConsoleSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Gsc
    }

    async fn fetch_window(&self, window: &DateWindow) -> Result<Vec<SyncRecord>, ConnectorError> {
        let mut records = Vec::new();
        for breakdown in [Breakdown::Date, Breakdown::Query, Breakdown::Page] {
            let rows = self.query(window, breakdown).await?;
            tracing::debug!(site = %self.site_url, ?breakdown, rows = rows.len(), "fetched search analytics");
            records.extend(rows.into_iter().map(SyncRecord::SearchPerformance));
        }
        Ok(records)
    }

    async fn verify(&self) -> Result<bool, ConnectorError> {
        let result = self
            .client
            .get_json::<serde_json::Value>(&self.site_path(), &[], SCOPES)
            .await
            .map(|_| ());
        verification_outcome(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    fn row(d: u32, dimension: SearchDimension, clicks: f64, impressions: f64, position: f64) -> SearchPerformance {
        SearchPerformance {
            date: day(d),
            dimension,
            clicks,
            impressions,
            ctr: 0.0,
            position,
        }
    }

    #[test]
    fn test_parse_rows_skips_bad_dates() {
        let response: QueryResponse = serde_json::from_value(json!({
            "rows": [
                { "keys": ["2026-06-01", "interior design dubai"], "clicks": 4, "impressions": 90, "ctr": 0.044, "position": 6.1 },
                { "keys": ["not-a-date", "x"], "clicks": 1 },
                { "keys": [] }
            ]
        }))
        .unwrap();
        let rows = parse_rows(&response, Breakdown::Query);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, day(1));
        assert_eq!(
            rows[0].dimension,
            SearchDimension::Query("interior design dubai".into())
        );
        assert_eq!(rows[0].impressions, 90.0);
    }

    #[test]
    fn test_insights() {
        let rows = vec![
            row(1, SearchDimension::Total, 10.0, 100.0, 4.0),
            row(2, SearchDimension::Total, 30.0, 300.0, 6.0),
            row(1, SearchDimension::Query("sofa".into()), 5.0, 50.0, 3.0),
            row(2, SearchDimension::Query("sofa".into()), 5.0, 40.0, 3.0),
            row(2, SearchDimension::Query("villa".into()), 8.0, 10.0, 2.0),
            row(1, SearchDimension::Page("/".into()), 20.0, 200.0, 1.0),
        ];
        let insights = insights(&rows, 10);
        assert_eq!(insights.total_clicks, 40.0);
        assert_eq!(insights.total_impressions, 400.0);
        assert_eq!(insights.average_ctr, 0.1);
        assert_eq!(insights.average_position, 5.0);
        assert_eq!(insights.top_queries[0].name, "sofa");
        assert_eq!(insights.top_queries[0].clicks, 10.0);
        assert_eq!(insights.top_queries[1].name, "villa");
        assert_eq!(insights.top_pages.len(), 1);
    }

    #[test]
    fn test_insights_empty() {
        let insights = insights(&[], 10);
        assert_eq!(insights.average_ctr, 0.0);
        assert_eq!(insights.average_position, 0.0);
        assert!(insights.top_queries.is_empty());
    }

    #[test]
    fn test_site_path_is_encoded() {
        let client = GoogleClient::new(Arc::new(StaticToken("t".into()))).unwrap();
        let source = SearchConsoleSource::new(client.clone(), "https://example.com/").unwrap();
        assert_eq!(
            source.site_path(),
            "https://searchconsole.googleapis.com/webmasters/v3/sites/https%3A%2F%2Fexample.com%2F"
        );
        assert!(SearchConsoleSource::new(client, "example.com").is_err());
    }
}
