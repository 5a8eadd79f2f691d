//! Analytics property models.
//!
//! A property is one external source (a GA4 property, a Search Console
//! site, a GTM account, a Business Profile location or a YouTube channel)
//! plus the sealed service-account key used to read it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_connectors::SourceKind;
use uuid::Uuid;

/// Outcome of the most recent sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Never,
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Never => "never",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }
}

/// Row of `cms.analytics_property`.
#[derive(Debug, Clone, FromRow)]
pub struct PropertyRow {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub external_id: String,
    pub client_email: String,
    /// Sealed service-account key
    pub credential: Vec<u8>,
    pub is_active: bool,
    pub sync_status: String,
    pub sync_error_message: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PropertyRow {
    pub fn source_kind(&self) -> Result<SourceKind, String> {
        self.kind.parse()
    }
}

/// Body of `POST /api/{source}/properties`.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyCreateRequest {
    pub name: String,

    /// GA4 property id, site URL, `accounts/N`, `accounts/A/locations/L`
    /// or channel id, depending on the source
    pub external_id: String,

    pub client_email: String,

    /// PEM private key; literal `\n` sequences are accepted
    pub private_key: String,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Property as returned by the API. The credential never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyResponse {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub external_id: String,
    pub client_email: String,
    pub is_active: bool,
    pub sync_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error_message: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for PropertyResponse {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            name: row.name,
            external_id: row.external_id,
            client_email: row.client_email,
            is_active: row.is_active,
            sync_status: row.sync_status,
            sync_error_message: row.sync_error_message,
            last_sync_at: row.last_sync_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRequest {
    #[serde(default, alias = "daysBack")]
    pub days_back: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub property_id: Uuid,
    pub kind: SourceKind,
    pub status: SyncStatus,
    pub records: usize,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// One property's line in a `sync-all` run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub property_id: Uuid,
    pub kind: String,
    pub name: String,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub property_id: Uuid,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_omits_credential() {
        let row = PropertyRow {
            id: Uuid::nil(),
            kind: "ga4".into(),
            name: "Main site".into(),
            external_id: "123456789".into(),
            client_email: "sync@studio.iam.gserviceaccount.com".into(),
            credential: vec![1, 2, 3],
            is_active: true,
            sync_status: "never".into(),
            sync_error_message: None,
            last_sync_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(row.source_kind(), Ok(SourceKind::Ga4));

        let json = serde_json::to_value(PropertyResponse::from(row)).unwrap();
        assert!(json.get("credential").is_none());
        assert!(json.get("sync_error_message").is_none());
        assert_eq!(json["sync_status"], "never");
    }
}
