//! Fetch-and-upsert for every analytics source.
//!
//! A sync asks its [`SyncSource`] for the trailing window, writes each
//! record under its natural key, then stamps the property. Writes are not
//! wrapped in a transaction: rows written before a failure stay written,
//! and the property is marked `error` with the failure message.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use studio_connectors::{DateWindow, SyncRecord, SyncSource};
use tracing::{error, info};
use uuid::Uuid;

use crate::db::queries::{metrics as metric_queries, property as property_queries};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

/// Where synced records and sync status go.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Insert or overwrite one record for the property.
    async fn upsert(&self, property_id: Uuid, record: &SyncRecord) -> AppResult<()>;

    async fn mark_success(&self, property_id: Uuid) -> AppResult<()>;

    async fn mark_error(&self, property_id: Uuid, message: &str) -> AppResult<()>;
}

/// The `cms` schema.
#[derive(Clone)]
pub struct PgSyncStore {
    pool: DbPool,
}

impl PgSyncStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn upsert(&self, property_id: Uuid, record: &SyncRecord) -> AppResult<()> {
        metric_queries::upsert_record(&self.pool, property_id, record).await
    }

    async fn mark_success(&self, property_id: Uuid) -> AppResult<()> {
        property_queries::mark_sync_success(&self.pool, property_id).await
    }

    async fn mark_error(&self, property_id: Uuid, message: &str) -> AppResult<()> {
        property_queries::mark_sync_error(&self.pool, property_id, message).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub records: usize,
    pub window: DateWindow,
}

/// Sync `[today - days_back, today]` for one property.
///
/// # Arguments
///
/// * `source` - Vendor source built from the property's credentials
/// * `store` - Where records are upserted and the property is stamped
/// * `property_id` - Property being synced
/// * `days_back` - Length of the trailing window
/// * `today` - Last day of the window
///
/// # Returns
///
/// The number of records written and the window fetched. On failure the
/// property is marked `error` with the message and the error is returned;
/// records written before the failure stay written.
pub async fn run_sync(
    source: &dyn SyncSource,
    store: &dyn SyncStore,
    property_id: Uuid,
    days_back: u32,
    today: NaiveDate,
) -> AppResult<SyncOutcome> {
    let window = DateWindow::trailing(today, days_back);
    info!(
        property_id = %property_id,
        kind = source.kind().as_str(),
        start = %window.start,
        end = %window.end,
        "Starting sync"
    );

    match fetch_and_store(source, store, property_id, &window).await {
        Ok(records) => {
            store.mark_success(property_id).await?;
            info!(property_id = %property_id, records, "Sync complete");
            Ok(SyncOutcome { records, window })
        }
        Err(e) => {
            let message = e.to_string();
            error!(property_id = %property_id, error = %message, "Sync failed");
            if let Err(mark) = store.mark_error(property_id, &message).await {
                error!(property_id = %property_id, error = %mark, "Failed to record sync error");
            }
            Err(e)
        }
    }
}

async fn fetch_and_store(
    source: &dyn SyncSource,
    store: &dyn SyncStore,
    property_id: Uuid,
    window: &DateWindow,
) -> AppResult<usize> {
    let records = source.fetch_window(window).await.map_err(AppError::from)?;
    for record in &records {
        store.upsert(property_id, record).await?;
    }
    Ok(records.len())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use studio_connectors::{ConnectorError, RecordKey, SourceKind};

    use super::*;

    /// In-memory store keyed like the real tables.
    #[derive(Default)]
    pub struct MemoryStore {
        pub rows: Mutex<HashMap<(Uuid, RecordKey), SyncRecord>>,
        pub status: Mutex<HashMap<Uuid, (String, Option<String>)>>,
        /// Fail the upsert with this index (0 based), counted across calls
        pub fail_at: Option<usize>,
        pub upserts: Mutex<usize>,
    }

    impl MemoryStore {
        pub fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn status_of(&self, id: Uuid) -> Option<(String, Option<String>)> {
            self.status.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl SyncStore for MemoryStore {
        async fn upsert(&self, property_id: Uuid, record: &SyncRecord) -> AppResult<()> {
            let mut count = self.upserts.lock().unwrap();
            if self.fail_at == Some(*count) {
                return Err(AppError::Internal("disk full".to_string()));
            }
            *count += 1;
            self.rows
                .lock()
                .unwrap()
                .insert((property_id, record.key()), record.clone());
            Ok(())
        }

        async fn mark_success(&self, property_id: Uuid) -> AppResult<()> {
            self.status
                .lock()
                .unwrap()
                .insert(property_id, ("success".to_string(), None));
            Ok(())
        }

        async fn mark_error(&self, property_id: Uuid, message: &str) -> AppResult<()> {
            self.status
                .lock()
                .unwrap()
                .insert(property_id, ("error".to_string(), Some(message.to_string())));
            Ok(())
        }
    }

    /// Returns a fixed record set, or a fixed error.
    pub struct FakeSource {
        pub kind: SourceKind,
        pub records: Result<Vec<SyncRecord>, ConnectorError>,
    }

    #[async_trait]
    impl SyncSource for FakeSource {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn fetch_window(&self, _window: &DateWindow) -> Result<Vec<SyncRecord>, ConnectorError> {
            self.records.clone()
        }

        async fn verify(&self) -> Result<bool, ConnectorError> {
            Ok(self.records.is_ok())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeSource, MemoryStore};
    use super::*;
    use studio_connectors::records::{Ga4DailyMetrics, SearchDimension, SearchPerformance};
    use studio_connectors::{ConnectorError, SourceKind};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn ga4_day(day: u32, sessions: i64) -> SyncRecord {
        SyncRecord::Ga4Daily(Ga4DailyMetrics {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            active_users: sessions / 2,
            new_users: 1,
            sessions,
            bounce_rate: 0.4,
            engagement_rate: 0.6,
            average_session_duration: 75.0,
            screen_page_views: sessions * 3,
            screen_page_views_per_session: 3.0,
            event_count: sessions * 10,
            conversions: 0,
            total_revenue: 0.0,
        })
    }

    fn query_row(day: u32, query: &str, clicks: f64) -> SyncRecord {
        SyncRecord::SearchPerformance(SearchPerformance {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            dimension: SearchDimension::Query(query.to_string()),
            clicks,
            impressions: clicks * 10.0,
            ctr: 0.1,
            position: 4.0,
        })
    }

    #[tokio::test]
    async fn test_resync_overwrites_instead_of_duplicating() {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();

        let first = FakeSource {
            kind: SourceKind::Ga4,
            records: Ok(vec![ga4_day(12, 10), ga4_day(13, 20)]),
        };
        let outcome = run_sync(&first, &store, id, 30, today()).await.unwrap();
        assert_eq!(outcome.records, 2);
        assert_eq!(outcome.window.start, NaiveDate::from_ymd_opt(2026, 9, 14).unwrap());
        assert_eq!(outcome.window.end, today());

        let second = FakeSource {
            kind: SourceKind::Ga4,
            records: Ok(vec![ga4_day(13, 25), ga4_day(14, 5)]),
        };
        run_sync(&second, &store, id, 30, today()).await.unwrap();

        assert_eq!(store.row_count(), 3);
        let rows = store.rows.lock().unwrap();
        let day13 = rows
            .values()
            .find_map(|r| match r {
                SyncRecord::Ga4Daily(m) if m.date.to_string() == "2026-10-13" => Some(m.sessions),
                _ => None,
            })
            .unwrap();
        assert_eq!(day13, 25);
        drop(rows);

        assert_eq!(store.status_of(id), Some(("success".to_string(), None)));
    }

    #[tokio::test]
    async fn test_dimension_rows_keyed_by_value() {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();
        let source = FakeSource {
            kind: SourceKind::Gsc,
            records: Ok(vec![
                query_row(13, "villa design dubai", 4.0),
                query_row(13, "majlis interior", 2.0),
                query_row(13, "villa design dubai", 6.0),
            ]),
        };
        run_sync(&source, &store, id, 7, today()).await.unwrap();
        assert_eq!(store.row_count(), 2);
    }

    #[tokio::test]
    async fn test_properties_do_not_share_rows() {
        let store = MemoryStore::default();
        let source = FakeSource {
            kind: SourceKind::Ga4,
            records: Ok(vec![ga4_day(13, 10)]),
        };
        run_sync(&source, &store, Uuid::new_v4(), 30, today()).await.unwrap();
        run_sync(&source, &store, Uuid::new_v4(), 30, today()).await.unwrap();
        assert_eq!(store.row_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_marks_error_and_propagates() {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();
        let source = FakeSource {
            kind: SourceKind::Youtube,
            records: Err(ConnectorError::Http {
                status: 403,
                body: "quota exceeded".to_string(),
            }),
        };

        let err = run_sync(&source, &store, id, 30, today()).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService(_)));

        let (status, message) = store.status_of(id).unwrap();
        assert_eq!(status, "error");
        assert!(message.unwrap().contains("quota exceeded"));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_upsert_failure_keeps_earlier_rows() {
        let store = MemoryStore {
            fail_at: Some(1),
            ..MemoryStore::default()
        };
        let id = Uuid::new_v4();
        let source = FakeSource {
            kind: SourceKind::Ga4,
            records: Ok(vec![ga4_day(11, 1), ga4_day(12, 2), ga4_day(13, 3)]),
        };

        let err = run_sync(&source, &store, id, 30, today()).await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(store.row_count(), 1);
        assert_eq!(store.status_of(id).unwrap().0, "error");
    }
}
