//! Analytics properties for every source kind.
//!
//! One service covers GA4, Search Console, Tag Manager, Business Profile
//! and YouTube. The kind in the route selects the vendor source; the
//! sync contract is the same for all of them.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use studio_connectors::google::business_profile::review_stats;
use studio_connectors::google::search_console::insights;
use studio_connectors::google::youtube::{summarize, ChannelStatistics};
use studio_connectors::google::{GoogleClient, YoutubeSource};
use studio_connectors::records::{
    BusinessReview, GtmItemKind, SearchPerformance, YoutubeDailyStats,
};
use studio_connectors::{build_source, ServiceAccountAuth, ServiceAccountKey, SourceKind, SyncSource};
use uuid::Uuid;

use crate::crypto::CredentialSealer;
use crate::db::models::{
    Ga4Totals, MetricsQuery, PropertyCreateRequest, PropertyMetrics, PropertyResponse, PropertyRow,
    SyncReport, SyncResponse, SyncStatus, VerifyResponse,
};
use crate::db::queries::{metrics as metric_queries, property as queries};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::result_ext::ResultExt;
use crate::services::sync::{run_sync, PgSyncStore};

/// Leaders shown in Search Console insights.
const TOP_ENTRIES: usize = 10;

#[derive(Clone)]
pub struct AnalyticsService {
    pool: DbPool,
    sealer: CredentialSealer,
    default_days: u32,
}

impl AnalyticsService {
    pub fn new(pool: DbPool, sealer: CredentialSealer, default_days: u32) -> Self {
        Self {
            pool,
            sealer,
            default_days,
        }
    }

    /// Register a property. The key and the external id are checked
    /// before anything is stored; the key is sealed at rest.
    pub async fn create(
        &self,
        kind: SourceKind,
        request: PropertyCreateRequest,
    ) -> AppResult<PropertyResponse> {
        let name = request.name.trim();
        let external_id = request.external_id.trim();
        if name.is_empty() || external_id.is_empty() {
            return Err(AppError::BadRequest("name and external_id are required".to_string()));
        }

        let mut key = ServiceAccountKey::new(request.client_email.trim(), request.private_key);
        key.project_id = request.project_id;
        key.validate()?;
        build_source(kind, external_id, Arc::new(ServiceAccountAuth::new(key.clone())))?;

        let sealed = self.sealer.seal_key(&key)?;
        let row = queries::insert_property(
            &self.pool,
            kind.as_str(),
            name,
            external_id,
            &key.client_email,
            &sealed,
            request.is_active.unwrap_or(true),
        )
        .await?;

        tracing::info!(property_id = %row.id, kind = %kind, external_id = %row.external_id, "Property registered");
        Ok(row.into())
    }

    pub async fn list(&self, kind: SourceKind) -> AppResult<Vec<PropertyResponse>> {
        let rows = queries::list_properties(&self.pool, kind.as_str()).await?;
        Ok(rows.into_iter().map(PropertyResponse::from).collect())
    }

    pub async fn get(&self, kind: SourceKind, id: Uuid) -> AppResult<PropertyResponse> {
        Ok(self.find(kind, id).await?.into())
    }

    pub async fn delete(&self, kind: SourceKind, id: Uuid) -> AppResult<()> {
        self.find(kind, id).await?;
        queries::delete_property(&self.pool, id).await?;
        tracing::info!(property_id = %id, kind = %kind, "Property deleted");
        Ok(())
    }

    pub async fn verify(&self, kind: SourceKind, id: Uuid) -> AppResult<VerifyResponse> {
        let row = self.find(kind, id).await?;
        let source = self.source_for(kind, &row)?;
        let verified = source.verify().await?;
        tracing::info!(property_id = %id, kind = %kind, verified, "Credentials verified");
        Ok(VerifyResponse {
            property_id: id,
            verified,
        })
    }

    pub async fn sync(&self, kind: SourceKind, id: Uuid, days_back: Option<u32>) -> AppResult<SyncResponse> {
        let row = self.find(kind, id).await?;
        ensure_active(&row)?;
        self.sync_row(kind, &row, days_back).await
    }

    /// Sync a property by id alone, whatever its kind.
    pub async fn sync_by_id(&self, id: Uuid, days_back: Option<u32>) -> AppResult<SyncResponse> {
        let row = queries::get_property(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property {} not found", id)))?;
        ensure_active(&row)?;
        let kind = row.source_kind().map_err(AppError::Internal)?;
        self.sync_row(kind, &row, days_back).await
    }

    /// Sync every active property in turn. A failure is reported for its
    /// property and the run moves on.
    pub async fn sync_all(&self, days_back: Option<u32>) -> AppResult<Vec<SyncReport>> {
        let rows = queries::list_active_properties(&self.pool).await?;
        tracing::info!(properties = rows.len(), "Starting sync of all active properties");

        let mut reports = Vec::with_capacity(rows.len());
        for row in &rows {
            let result = match row.source_kind() {
                Ok(kind) => self.sync_row(kind, row, days_back).await,
                Err(e) => Err(AppError::Internal(e)),
            };
            reports.push(report_for(row, result));
        }

        let failed = reports
            .iter()
            .filter(|r| r.status == SyncStatus::Error)
            .count();
        tracing::info!(properties = reports.len(), failed, "Finished sync of all active properties");
        Ok(reports)
    }

    pub async fn metrics(
        &self,
        kind: SourceKind,
        id: Uuid,
        query: MetricsQuery,
    ) -> AppResult<PropertyMetrics> {
        let row = self.find(kind, id).await?;
        let today = Utc::now().date_naive();
        let (start, end) = resolve_window(&query, today, self.default_days)?;
        let pool = &self.pool;

        let metrics = match kind {
            SourceKind::Ga4 => {
                let daily = metric_queries::list_ga4_daily(pool, id, start, end).await?;
                PropertyMetrics::Ga4 {
                    totals: Ga4Totals::from_days(&daily),
                    traffic_sources: metric_queries::list_ga4_traffic(pool, id, start, end).await?,
                    latest_realtime: metric_queries::latest_ga4_realtime(pool, id).await?,
                    daily,
                }
            }
            SourceKind::Gsc => {
                let rows = metric_queries::list_search(pool, id, start, end).await?;
                let performance: Vec<SearchPerformance> = rows.iter().map(SearchPerformance::from).collect();
                PropertyMetrics::Gsc {
                    insights: insights(&performance, TOP_ENTRIES),
                    rows,
                }
            }
            SourceKind::Gtm => PropertyMetrics::Gtm {
                containers: metric_queries::list_gtm_containers(pool, id).await?,
                tags: metric_queries::list_gtm_items(pool, id, GtmItemKind::Tag).await?,
                triggers: metric_queries::list_gtm_items(pool, id, GtmItemKind::Trigger).await?,
                variables: metric_queries::list_gtm_items(pool, id, GtmItemKind::Variable).await?,
            },
            SourceKind::Gbp => {
                let reviews = metric_queries::list_reviews(pool, id).await?;
                let parsed: Vec<BusinessReview> = reviews.iter().map(BusinessReview::from).collect();
                PropertyMetrics::Gbp {
                    stats: review_stats(&parsed, Utc::now()),
                    reviews,
                }
            }
            SourceKind::Youtube => {
                let daily = metric_queries::list_youtube_daily(pool, id, start, end).await?;
                let stats: Vec<YoutubeDailyStats> = daily.iter().map(YoutubeDailyStats::from).collect();
                let channel = self.channel_statistics(&row).await;
                PropertyMetrics::Youtube {
                    summary: summarize(&stats, channel.as_ref()),
                    daily,
                }
            }
        };
        Ok(metrics)
    }

    async fn sync_row(
        &self,
        kind: SourceKind,
        row: &PropertyRow,
        days_back: Option<u32>,
    ) -> AppResult<SyncResponse> {
        let days = sync_days(days_back, self.default_days)?;
        let source = match self.source_for(kind, row) {
            Ok(source) => source,
            Err(e) => {
                queries::mark_sync_error(&self.pool, row.id, &e.to_string())
                    .await
                    .best_effort("recording sync error");
                return Err(e);
            }
        };

        let store = PgSyncStore::new(self.pool.clone());
        let outcome = run_sync(
            source.as_ref(),
            &store,
            row.id,
            days,
            Utc::now().date_naive(),
        )
        .await?;

        Ok(SyncResponse {
            property_id: row.id,
            kind,
            status: SyncStatus::Success,
            records: outcome.records,
            window_start: outcome.window.start,
            window_end: outcome.window.end,
        })
    }

    fn open_key(&self, row: &PropertyRow) -> AppResult<ServiceAccountKey> {
        self.sealer
            .open_key(&row.credential)
            .log(format!("opening credential of property {}", row.id))
    }

    fn source_for(&self, kind: SourceKind, row: &PropertyRow) -> AppResult<Box<dyn SyncSource>> {
        let key = self.open_key(row)?;
        let source = build_source(kind, &row.external_id, Arc::new(ServiceAccountAuth::new(key)))?;
        Ok(source)
    }

    /// Lifetime channel counters. Best-effort: the summary is still
    /// useful without them.
    async fn channel_statistics(&self, row: &PropertyRow) -> Option<ChannelStatistics> {
        let key = self.open_key(row).best_effort("opening YouTube credential")?;
        let client = GoogleClient::new(Arc::new(ServiceAccountAuth::new(key)))
            .best_effort("building YouTube client")?;
        let source = YoutubeSource::new(client, &row.external_id).best_effort("building YouTube source")?;
        source
            .channel_statistics()
            .await
            .best_effort("fetching YouTube channel statistics")
            .flatten()
    }

    async fn find(&self, kind: SourceKind, id: Uuid) -> AppResult<PropertyRow> {
        queries::get_property(&self.pool, id)
            .await?
            .filter(|row| row.kind == kind.as_str())
            .ok_or_else(|| AppError::NotFound(format!("{} property {} not found", kind.display_name(), id)))
    }
}

fn sync_days(requested: Option<u32>, default_days: u32) -> AppResult<u32> {
    match requested.unwrap_or(default_days) {
        0 => Err(AppError::BadRequest("days_back must be at least 1".to_string())),
        days => Ok(days),
    }
}

/// Inactive properties are only synced once re-enabled.
fn ensure_active(row: &PropertyRow) -> AppResult<()> {
    if row.is_active {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Property {} is not active", row.id)))
    }
}

/// Date range for a metrics read: `end` defaults to today and `start` to
/// `default_days` before `end`.
fn resolve_window(
    query: &MetricsQuery,
    today: NaiveDate,
    default_days: u32,
) -> AppResult<(NaiveDate, NaiveDate)> {
    let end = query.end.unwrap_or(today);
    let start = match query.start {
        Some(start) => start,
        None => end
            .checked_sub_days(Days::new(u64::from(default_days)))
            .ok_or_else(|| AppError::BadRequest(format!("end {} is out of range", end)))?,
    };
    if start > end {
        return Err(AppError::BadRequest(format!(
            "start {} is after end {}",
            start, end
        )));
    }
    Ok((start, end))
}

fn report_for(row: &PropertyRow, result: AppResult<SyncResponse>) -> SyncReport {
    let (status, records, error) = match result {
        Ok(response) => (SyncStatus::Success, Some(response.records), None),
        Err(e) => (SyncStatus::Error, None, Some(e.to_string())),
    };
    SyncReport {
        property_id: row.id,
        kind: row.kind.clone(),
        name: row.name.clone(),
        status,
        records,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row() -> PropertyRow {
        PropertyRow {
            id: Uuid::new_v4(),
            kind: "gsc".into(),
            name: "Marketing site".into(),
            external_id: "sc-domain:example.com".into(),
            client_email: "sync@studio.iam.gserviceaccount.com".into(),
            credential: Vec::new(),
            is_active: true,
            sync_status: "never".into(),
            sync_error_message: None,
            last_sync_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_window_defaults() {
        let today = date(2026, 10, 14);
        let (start, end) = resolve_window(&MetricsQuery::default(), today, 30).unwrap();
        assert_eq!(end, today);
        assert_eq!(start, date(2026, 9, 14));

        let query = MetricsQuery {
            start: Some(date(2026, 10, 1)),
            end: None,
        };
        assert_eq!(resolve_window(&query, today, 30).unwrap(), (date(2026, 10, 1), today));
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let query = MetricsQuery {
            start: Some(date(2026, 10, 10)),
            end: Some(date(2026, 10, 1)),
        };
        assert!(matches!(
            resolve_window(&query, date(2026, 10, 14), 30),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_window_rejects_end_at_calendar_floor() {
        let query = MetricsQuery {
            start: None,
            end: Some(NaiveDate::MIN),
        };
        assert!(matches!(
            resolve_window(&query, date(2026, 10, 14), 30),
            Err(AppError::BadRequest(_))
        ));

        let query: MetricsQuery = serde_json::from_value(serde_json::json!({
            "end": "-262143-01-01"
        }))
        .unwrap();
        assert!(resolve_window(&query, date(2026, 10, 14), u32::MAX).is_err());
    }

    #[test]
    fn test_inactive_property_not_synced() {
        assert!(ensure_active(&row()).is_ok());

        let mut inactive = row();
        inactive.is_active = false;
        assert!(matches!(ensure_active(&inactive), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_sync_days() {
        assert_eq!(sync_days(None, 30).unwrap(), 30);
        assert_eq!(sync_days(Some(7), 30).unwrap(), 7);
        assert!(sync_days(Some(0), 30).is_err());
    }

    #[test]
    fn test_report_for_failure_keeps_message() {
        let row = row();
        let report = report_for(&row, Err(AppError::ExternalService("HTTP 403: forbidden".into())));
        assert_eq!(report.status, SyncStatus::Error);
        assert_eq!(report.records, None);
        assert!(report.error.unwrap().contains("403"));

        let ok = report_for(
            &row,
            Ok(SyncResponse {
                property_id: row.id,
                kind: SourceKind::Gsc,
                status: SyncStatus::Success,
                records: 12,
                window_start: date(2026, 9, 14),
                window_end: date(2026, 10, 14),
            }),
        );
        assert_eq!(ok.status, SyncStatus::Success);
        assert_eq!(ok.records, Some(12));
        assert_eq!(ok.kind, "gsc");
    }
}
