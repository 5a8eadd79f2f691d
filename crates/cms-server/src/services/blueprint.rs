//! Blueprint service: field schemas and their bilingual instances.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::content::{localize, Locale};
use crate::db::models::{
    BlueprintCreateRequest, BlueprintRow, InstanceCreateRequest, InstanceRow, LocalizedInstance,
};
use crate::db::queries::blueprint as queries;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

const DEFAULT_INSTANCE_STATUS: &str = "draft";

/// An instance as stored, or resolved for one locale.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InstanceView {
    Raw(InstanceRow),
    Localized(LocalizedInstance),
}

#[derive(Clone)]
pub struct BlueprintService {
    pool: DbPool,
}

impl BlueprintService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: BlueprintCreateRequest) -> AppResult<BlueprintRow> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }
        validate_fields(&request)?;
        let fields = serde_json::to_value(&request.fields)?;

        let row = queries::insert_blueprint(
            &self.pool,
            name,
            request.description.as_deref(),
            &fields,
        )
        .await?;

        tracing::info!(blueprint_id = %row.id, name = %row.name, "Blueprint created");
        Ok(row)
    }

    pub async fn list(&self) -> AppResult<Vec<BlueprintRow>> {
        queries::list_blueprints(&self.pool).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BlueprintRow> {
        queries::get_blueprint(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blueprint {} not found", id)))
    }

    pub async fn list_instances(&self, blueprint_id: Uuid) -> AppResult<Vec<InstanceRow>> {
        self.get(blueprint_id).await?;
        queries::list_instances(&self.pool, blueprint_id).await
    }

    pub async fn create_instance(
        &self,
        blueprint_id: Uuid,
        request: InstanceCreateRequest,
    ) -> AppResult<InstanceRow> {
        self.get(blueprint_id).await?;

        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }
        let data_en = request.data_en.unwrap_or_else(|| json!({}));
        let data_ar = request.data_ar.unwrap_or_else(|| json!({}));
        let status = request
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_INSTANCE_STATUS);

        let row = queries::insert_instance(&self.pool, blueprint_id, name, &data_en, &data_ar, status)
            .await?;

        tracing::info!(
            blueprint_id = %blueprint_id,
            instance_id = %row.id,
            "Blueprint instance created"
        );
        Ok(row)
    }

    /// Fetch an instance; with a locale, resolve its payload for it.
    pub async fn get_instance(&self, id: Uuid, locale: Option<Locale>) -> AppResult<InstanceView> {
        let row = queries::get_instance(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blueprint instance {} not found", id)))?;

        Ok(match locale {
            Some(locale) => InstanceView::Localized(localize_instance(&row, locale)),
            None => InstanceView::Raw(row),
        })
    }
}

fn validate_fields(request: &BlueprintCreateRequest) -> AppResult<()> {
    let mut seen = std::collections::HashSet::new();
    for field in &request.fields {
        let name = field.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("every field needs a name".to_string()));
        }
        if !seen.insert(name) {
            return Err(AppError::BadRequest(format!("duplicate field '{}'", name)));
        }
    }
    Ok(())
}

pub fn localize_instance(row: &InstanceRow, locale: Locale) -> LocalizedInstance {
    let data: Value = localize(row.data_for(locale), locale);
    LocalizedInstance {
        id: row.id,
        blueprint_id: row.blueprint_id,
        name: row.name.clone(),
        locale,
        data,
        status: row.status.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::BlueprintField;
    use chrono::Utc;

    fn field(name: &str) -> BlueprintField {
        BlueprintField {
            name: name.to_string(),
            field_type: "text".to_string(),
            label: None,
            required: false,
            bilingual: true,
        }
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let request = BlueprintCreateRequest {
            name: "Testimonial".into(),
            description: None,
            fields: vec![field("quote"), field("author"), field("quote")],
        };
        assert!(matches!(validate_fields(&request), Err(AppError::BadRequest(_))));

        let request = BlueprintCreateRequest {
            fields: vec![field("quote"), field("author")],
            ..request
        };
        assert!(validate_fields(&request).is_ok());
    }

    #[test]
    fn test_localize_instance_uses_arabic_payload() {
        let row = InstanceRow {
            id: Uuid::nil(),
            blueprint_id: Uuid::nil(),
            name: "Consultation".into(),
            data_en: json!({ "title": "Book a consultation", "cta": { "en": "Send", "ar": "إرسال" } }),
            data_ar: json!({ "title": "احجز استشارة", "cta": { "en": "Send", "ar": "إرسال" } }),
            status: "published".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let ar = localize_instance(&row, Locale::Ar);
        assert_eq!(ar.data, json!({ "title": "احجز استشارة", "cta": "إرسال" }));
        assert_eq!(ar.locale, Locale::Ar);

        let en = localize_instance(&row, Locale::En);
        assert_eq!(en.data, json!({ "title": "Book a consultation", "cta": "Send" }));
    }
}
