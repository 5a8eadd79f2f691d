//! Dynamic form submissions.
//!
//! A submission is stored first. Its form definition (a `Form` blueprint
//! instance) then decides the follow-ups: a notification mail and a CRM
//! lead. Both follow-ups are best-effort and run independently; neither
//! can fail the submission.

use axum::http::{header::USER_AGENT, HeaderMap};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::split_recipients;
use crate::content::Locale;
use crate::db::models::{
    ClientInfo, CrmIntegration, FormSettings, FormSubmissionRow, FormSubmitRequest,
    FormSubmitResponse, LeadStatus, NewLead, NotificationSettings, FORM_BLUEPRINT,
};
use crate::db::queries::{blueprint as blueprint_queries, form as queries};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::mail::{form_submission_email, Mailer};
use crate::rate_limit::client_ip;
use crate::result_ext::ResultExt;
use crate::services::lead::record_new_lead;

const DEFAULT_SUBJECT: &str = "New Form Submission";
const DEFAULT_LEAD_SOURCE: &str = "website_form";
const AUTO_QUALIFIED_SCORE: i32 = 75;
const DEFAULT_SCORE: i32 = 50;

#[derive(Clone)]
pub struct FormService {
    pool: DbPool,
    mailer: Mailer,
}

impl FormService {
    pub fn new(pool: DbPool, mailer: Mailer) -> Self {
        Self { pool, mailer }
    }

    pub async fn submit(
        &self,
        request: FormSubmitRequest,
        client: ClientInfo,
    ) -> AppResult<FormSubmitResponse> {
        let form_id = request
            .form_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let (Some(form_id), Some(data)) = (form_id, request.data) else {
            return Err(AppError::BadRequest(
                "Missing required fields: formId and data are required".to_string(),
            ));
        };

        let locale = Locale::from_param(request.locale.as_deref());
        let form_name = request
            .form_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(form_id);

        let submission =
            queries::insert_submission(&self.pool, form_id, form_name, &data, locale.as_str(), &client)
                .await?;
        tracing::info!(
            submission_id = %submission.id,
            form_id = %form_id,
            locale = %locale,
            "Form submission stored"
        );

        if let Some(settings) = self
            .form_settings(form_id, locale)
            .await
            .best_effort("loading form settings")
            .flatten()
        {
            self.follow_up(&submission, &settings, locale).await;
        }

        Ok(FormSubmitResponse {
            success: true,
            message: "Form submitted successfully".to_string(),
            submission_id: submission.id,
        })
    }

    pub async fn list(&self, form_id: Option<&str>) -> AppResult<Vec<FormSubmissionRow>> {
        queries::list_submissions(&self.pool, form_id).await
    }

    /// Settings of the form definition, when `form_id` names one.
    async fn form_settings(&self, form_id: &str, locale: Locale) -> AppResult<Option<FormSettings>> {
        let Ok(instance_id) = form_id.parse::<Uuid>() else {
            tracing::debug!(form_id = %form_id, "Form id is not a definition id, no follow-ups");
            return Ok(None);
        };
        let Some(instance) =
            blueprint_queries::get_instance_of(&self.pool, instance_id, FORM_BLUEPRINT).await?
        else {
            return Ok(None);
        };
        let settings = serde_json::from_value(instance.data_for(locale).clone())?;
        Ok(Some(settings))
    }

    async fn follow_up(&self, submission: &FormSubmissionRow, settings: &FormSettings, locale: Locale) {
        if let Some(notifications) = settings.notifications.as_ref() {
            self.notify(submission, notifications)
                .await
                .best_effort("sending form notification");
        }

        if let Some(crm) = settings.crm_integration.as_ref().filter(|c| c.connect_with_crm) {
            let lead = map_crm_lead(&submission.data, crm, submission.id, locale);
            let description = format!("Created from form submission {}", submission.id);
            record_new_lead(&self.pool, &lead, &description)
                .await
                .best_effort("creating CRM lead from form submission");
        }
    }

    async fn notify(
        &self,
        submission: &FormSubmissionRow,
        notifications: &NotificationSettings,
    ) -> AppResult<bool> {
        let recipients = match notifications.recipients.as_deref() {
            Some(list) if notifications.enabled => split_recipients(list),
            _ => return Ok(false),
        };
        let subject = notifications
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUBJECT);
        let email = form_submission_email(
            subject,
            submission.form_name.as_deref().unwrap_or(&submission.form_id),
            submission.id,
            submission.submitted_at,
            &submission.data,
        );
        self.mailer.send(&recipients, &email).await
    }
}

/// Request metadata stored with a submission.
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        ip_address: client_ip(headers),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Build a CRM lead from submitted form data.
///
/// Each lead field reads its mapped key first, then the conventional key
/// names for that field. Blank and missing values are skipped alike.
pub fn map_crm_lead(data: &Value, crm: &CrmIntegration, submission_id: Uuid, locale: Locale) -> NewLead {
    let empty = Map::new();
    let fields = data.as_object().unwrap_or(&empty);
    let mapping = &crm.field_mapping;

    let read = |mapped: &Option<String>, fallbacks: &[&str]| -> Option<String> {
        mapped
            .as_deref()
            .into_iter()
            .chain(fallbacks.iter().copied())
            .find_map(|key| fields.get(key).and_then(text_value))
    };

    let message = read(&mapping.message_field, &["message", "comments", "description"]);
    let status = crm
        .default_status
        .as_deref()
        .and_then(|s| s.parse::<LeadStatus>().ok())
        .unwrap_or_default();

    NewLead {
        name: read(&mapping.name_field, &["name", "fullName"]).unwrap_or_else(|| "Unknown".to_string()),
        email: read(&mapping.email_field, &["email"]),
        phone: read(&mapping.phone_field, &["phone", "phoneNumber"]).unwrap_or_default(),
        company: fields.get("company").and_then(text_value),
        project_type: read(&mapping.project_type_field, &["projectType", "serviceType"])
            .unwrap_or_else(|| "General Inquiry".to_string()),
        budget: read(&mapping.budget_field, &["budget", "budgetRange"]),
        timeline: read(&mapping.timeline_field, &["timeline", "startDate"]),
        city: read(&mapping.city_field, &["city", "location"]),
        notes: Some(format!(
            "Form submission: {}\n{}",
            submission_id,
            message.as_deref().unwrap_or_default()
        )),
        message,
        locale: locale.as_str().to_string(),
        source: crm
            .lead_source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_LEAD_SOURCE)
            .to_string(),
        status,
        qualified: crm.auto_qualify,
        score: if crm.auto_qualify {
            AUTO_QUALIFIED_SCORE
        } else {
            DEFAULT_SCORE
        },
        form_submission_id: Some(submission_id),
    }
}

/// Text of a scalar form value. Blank strings and non-scalars are `None`.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::FieldMapping;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn crm(auto_qualify: bool) -> CrmIntegration {
        CrmIntegration {
            connect_with_crm: true,
            field_mapping: FieldMapping::default(),
            lead_source: None,
            default_status: None,
            auto_qualify,
        }
    }

    #[test]
    fn test_conventional_keys_and_defaults() {
        let id = Uuid::new_v4();
        let data = json!({
            "fullName": "Omar Haddad",
            "phoneNumber": "+971 55 000 1111",
            "serviceType": "Majlis Design",
            "location": "Abu Dhabi",
            "comments": "Looking for a modern majlis"
        });

        let lead = map_crm_lead(&data, &crm(false), id, Locale::En);
        assert_eq!(lead.name, "Omar Haddad");
        assert_eq!(lead.phone, "+971 55 000 1111");
        assert_eq!(lead.project_type, "Majlis Design");
        assert_eq!(lead.city.as_deref(), Some("Abu Dhabi"));
        assert_eq!(lead.email, None);
        assert_eq!(lead.source, "website_form");
        assert_eq!(lead.status, LeadStatus::New);
        assert!(!lead.qualified);
        assert_eq!(lead.score, 50);
        assert_eq!(lead.form_submission_id, Some(id));
        assert_eq!(
            lead.notes.as_deref(),
            Some(format!("Form submission: {}\nLooking for a modern majlis", id).as_str())
        );
    }

    #[test]
    fn test_mapped_keys_win() {
        let mut config = crm(true);
        config.field_mapping = FieldMapping {
            name_field: Some("clientName".into()),
            budget_field: Some("estimate".into()),
            ..FieldMapping::default()
        };
        config.lead_source = Some("landing_page".into());
        config.default_status = Some("contacted".into());

        let data = json!({
            "clientName": "Layla",
            "name": "ignored",
            "estimate": 250000,
            "budget": "ignored"
        });
        let lead = map_crm_lead(&data, &config, Uuid::nil(), Locale::Ar);
        assert_eq!(lead.name, "Layla");
        assert_eq!(lead.budget.as_deref(), Some("250000"));
        assert_eq!(lead.source, "landing_page");
        assert_eq!(lead.status, LeadStatus::Contacted);
        assert!(lead.qualified);
        assert_eq!(lead.score, 75);
        assert_eq!(lead.locale, "ar");
    }

    #[test]
    fn test_empty_data_falls_back_to_placeholders() {
        let lead = map_crm_lead(&json!({ "name": "  " }), &crm(false), Uuid::nil(), Locale::En);
        assert_eq!(lead.name, "Unknown");
        assert_eq!(lead.phone, "");
        assert_eq!(lead.project_type, "General Inquiry");
        assert_eq!(lead.message, None);
    }

    #[test]
    fn test_client_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.4, 10.0.0.1"));
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));

        let info = client_info(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("198.51.100.4"));
        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
