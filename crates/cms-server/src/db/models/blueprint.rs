//! Content blueprints: reusable field schemas with bilingual instances.
//!
//! A blueprint named `Form` describes a dynamic form; its instances carry
//! the notification and CRM settings read by the form-submit endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::content::Locale;

/// Blueprint name that marks form definitions.
pub const FORM_BLUEPRINT: &str = "Form";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRow {
    pub id: Uuid,
    pub blueprint_id: Uuid,
    pub name: String,
    pub data_en: Value,
    pub data_ar: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InstanceRow {
    /// Payload for a locale. An empty Arabic payload falls back to English.
    pub fn data_for(&self, locale: Locale) -> &Value {
        match locale {
            Locale::Ar if !is_empty_payload(&self.data_ar) => &self.data_ar,
            Locale::Ar => &self.data_en,
            Locale::En => &self.data_en,
        }
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// One field of a blueprint schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub bilingual: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlueprintCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<BlueprintField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceCreateRequest {
    pub name: String,
    #[serde(default)]
    pub data_en: Option<Value>,
    #[serde(default)]
    pub data_ar: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Instance resolved for one locale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedInstance {
    pub id: Uuid,
    pub blueprint_id: Uuid,
    pub name: String,
    pub locale: Locale,
    pub data: Value,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(data_en: Value, data_ar: Value) -> InstanceRow {
        InstanceRow {
            id: Uuid::nil(),
            blueprint_id: Uuid::nil(),
            name: "Contact".into(),
            data_en,
            data_ar,
            status: "published".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_data_for_falls_back_to_english() {
        let row = instance(json!({ "title": "Contact us" }), json!({}));
        assert_eq!(row.data_for(Locale::Ar), &json!({ "title": "Contact us" }));

        let row = instance(json!({ "title": "Contact us" }), json!({ "title": "اتصل بنا" }));
        assert_eq!(row.data_for(Locale::Ar), &json!({ "title": "اتصل بنا" }));
        assert_eq!(row.data_for(Locale::En), &json!({ "title": "Contact us" }));
    }
}
