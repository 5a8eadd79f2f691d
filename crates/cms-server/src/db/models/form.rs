//! Dynamic form submissions and their CRM settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmissionRow {
    pub id: Uuid,
    pub form_id: String,
    pub form_name: Option<String>,
    pub data: Value,
    pub locale: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
}

/// Body of `POST /api/form-submit`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmitRequest {
    #[serde(default)]
    pub form_id: Option<String>,
    #[serde(default)]
    pub form_name: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmitResponse {
    pub success: bool,
    pub message: String,
    pub submission_id: Uuid,
}

/// Request metadata stored with a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Settings read from a form definition's localized payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSettings {
    #[serde(default)]
    pub notifications: Option<NotificationSettings>,
    #[serde(default)]
    pub crm_integration: Option<CrmIntegration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Comma separated
    #[serde(default)]
    pub recipients: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmIntegration {
    #[serde(default, rename = "connectWithCRM", alias = "connectWithCrm")]
    pub connect_with_crm: bool,
    #[serde(default)]
    pub field_mapping: FieldMapping,
    #[serde(default)]
    pub lead_source: Option<String>,
    #[serde(default)]
    pub default_status: Option<String>,
    #[serde(default)]
    pub auto_qualify: bool,
}

/// Which submission keys hold each lead field. Unmapped fields fall back
/// to conventional key names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(default)]
    pub name_field: Option<String>,
    #[serde(default)]
    pub email_field: Option<String>,
    #[serde(default)]
    pub phone_field: Option<String>,
    #[serde(default)]
    pub project_type_field: Option<String>,
    #[serde(default)]
    pub budget_field: Option<String>,
    #[serde(default)]
    pub timeline_field: Option<String>,
    #[serde(default)]
    pub city_field: Option<String>,
    #[serde(default)]
    pub message_field: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionListQuery {
    #[serde(default)]
    pub form_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_parse_from_form_payload() {
        let settings: FormSettings = serde_json::from_value(json!({
            "title": "Consultation",
            "notifications": { "enabled": true, "recipients": "a@x.ae, b@x.ae" },
            "crmIntegration": {
                "connectWithCRM": true,
                "autoQualify": true,
                "fieldMapping": { "nameField": "fullName" }
            }
        }))
        .unwrap();

        let crm = settings.crm_integration.unwrap();
        assert!(crm.connect_with_crm);
        assert!(crm.auto_qualify);
        assert_eq!(crm.field_mapping.name_field.as_deref(), Some("fullName"));
        assert!(settings.notifications.unwrap().enabled);
    }
}
