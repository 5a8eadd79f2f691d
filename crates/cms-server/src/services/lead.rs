//! Lead capture and the CRM pipeline.

use uuid::Uuid;

use crate::content::Locale;
use crate::db::models::{
    ActivityCreateRequest, LeadAccepted, LeadActivityRow, LeadDetail, LeadRow, LeadStatus,
    LeadSubmission, LeadUpdateRequest, NewLead,
};
use crate::db::queries::lead as queries;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::mail::Mailer;
use crate::rate_limit::{RateLimiter, UNKNOWN_CLIENT};
use crate::result_ext::ResultExt;
use crate::validation::{is_valid_email, is_valid_phone, non_blank};

const DEFAULT_SOURCE: &str = "website";
const MAX_SCORE: i32 = 100;

#[derive(Clone)]
pub struct LeadService {
    pool: DbPool,
    limiter: RateLimiter,
    mailer: Mailer,
}

impl LeadService {
    pub fn new(pool: DbPool, limiter: RateLimiter, mailer: Mailer) -> Self {
        Self {
            pool,
            limiter,
            mailer,
        }
    }

    /// Public lead capture. The rate limit is checked before the body is
    /// looked at, so rejected clients learn nothing about validation.
    pub async fn submit(
        &self,
        client_ip: Option<&str>,
        submission: LeadSubmission,
    ) -> AppResult<LeadAccepted> {
        let key = client_ip.unwrap_or(UNKNOWN_CLIENT);
        if !self.limiter.check(key).await {
            tracing::warn!(client = %key, "Lead submission rate limited");
            return Err(AppError::RateLimited(
                "Too many requests. Please try again later.".to_string(),
            ));
        }

        let lead = validate_submission(&submission)?;
        let row = record_new_lead(&self.pool, &lead, "Lead submitted from website").await?;

        self.mailer
            .notify_new_lead(&row, client_ip)
            .await
            .best_effort("sending lead notification");

        Ok(LeadAccepted {
            success: true,
            message: "Lead submitted successfully".to_string(),
            lead_id: row.id,
        })
    }

    pub async fn list(&self, status: Option<LeadStatus>) -> AppResult<Vec<LeadRow>> {
        queries::list_leads(&self.pool, status).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<LeadDetail> {
        let lead = self.find(id).await?;
        let activities = queries::list_activities(&self.pool, id).await?;
        Ok(LeadDetail { lead, activities })
    }

    pub async fn update(&self, id: Uuid, update: LeadUpdateRequest) -> AppResult<LeadRow> {
        if let Some(score) = update.score {
            if !(0..=MAX_SCORE).contains(&score) {
                return Err(AppError::BadRequest(format!(
                    "score must be between 0 and {}",
                    MAX_SCORE
                )));
            }
        }

        let before = self.find(id).await?;
        let after = queries::update_lead(&self.pool, id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;

        if before.status != after.status {
            let description = format!("Status changed from {} to {}", before.status, after.status);
            queries::insert_activity(&self.pool, id, "status_change", &description).await?;
            tracing::info!(lead_id = %id, from = %before.status, to = %after.status, "Lead status changed");
        }

        Ok(after)
    }

    pub async fn add_activity(
        &self,
        lead_id: Uuid,
        request: ActivityCreateRequest,
    ) -> AppResult<LeadActivityRow> {
        let kind = request.kind.trim();
        let description = request.description.trim();
        if kind.is_empty() || description.is_empty() {
            return Err(AppError::BadRequest("kind and description are required".to_string()));
        }
        self.find(lead_id).await?;
        queries::insert_activity(&self.pool, lead_id, kind, description).await
    }

    pub async fn list_activities(&self, lead_id: Uuid) -> AppResult<Vec<LeadActivityRow>> {
        self.find(lead_id).await?;
        queries::list_activities(&self.pool, lead_id).await
    }

    async fn find(&self, id: Uuid) -> AppResult<LeadRow> {
        queries::get_lead(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
    }
}

/// Insert a lead and open its timeline with a `created` activity.
pub async fn record_new_lead(pool: &DbPool, lead: &NewLead, description: &str) -> AppResult<LeadRow> {
    let row = queries::insert_lead(pool, lead).await?;
    queries::insert_activity(pool, row.id, "created", description).await?;
    tracing::info!(
        lead_id = %row.id,
        source = %row.source,
        project_type = %row.project_type,
        score = row.score,
        "Lead recorded"
    );
    Ok(row)
}

/// Check a public submission and turn it into column values.
pub fn validate_submission(submission: &LeadSubmission) -> AppResult<NewLead> {
    let name = non_blank(submission.name.as_deref());
    let email = non_blank(submission.email.as_deref());
    let phone = non_blank(submission.phone.as_deref());
    let project_type = non_blank(submission.project_type.as_deref());

    let missing: Vec<&str> = [
        ("name", name),
        ("email", email),
        ("phone", phone),
        ("projectType", project_type),
    ]
    .iter()
    .filter(|(_, value)| value.is_none())
    .map(|(field, _)| *field)
    .collect();

    let (Some(name), Some(email), Some(phone), Some(project_type)) = (name, email, phone, project_type)
    else {
        return Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    if !is_valid_email(email) {
        return Err(AppError::BadRequest("Invalid email format".to_string()));
    }
    if !is_valid_phone(phone) {
        return Err(AppError::BadRequest("Invalid phone number".to_string()));
    }

    let owned = |v: Option<&String>| non_blank(v.map(String::as_str)).map(str::to_string);
    let budget = owned(submission.budget.as_ref());
    let timeline = owned(submission.timeline.as_ref());
    let source = owned(submission.source.as_ref()).unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let score = lead_score(budget.as_deref(), timeline.as_deref(), &source, true, true);

    Ok(NewLead {
        name: name.to_string(),
        email: Some(email.to_string()),
        phone: phone.to_string(),
        company: owned(submission.company.as_ref()),
        project_type: project_type.to_string(),
        budget,
        timeline,
        city: owned(submission.city.as_ref()),
        message: owned(submission.message.as_ref()),
        locale: Locale::from_param(submission.locale.as_deref()).as_str().to_string(),
        source,
        status: LeadStatus::New,
        qualified: false,
        score,
        notes: None,
        form_submission_id: None,
    })
}

/// Initial score from budget band, timeline, source and contact quality,
/// capped at 100. Unrecognised values contribute nothing.
pub fn lead_score(
    budget: Option<&str>,
    timeline: Option<&str>,
    source: &str,
    has_email: bool,
    has_phone: bool,
) -> i32 {
    let budget_points = match budget {
        Some("ultra_luxury") => 30,
        Some("luxury") => 20,
        Some("mid_range") => 10,
        Some("economical") => 5,
        _ => 0,
    };
    let timeline_points = match timeline {
        Some("immediate") => 25,
        Some("1_month") => 20,
        Some("3_months") => 15,
        Some("6_months") => 10,
        Some("flexible") => 5,
        _ => 0,
    };
    let source_points = match source {
        "referral" => 20,
        "walk_in" => 15,
        "website" => 10,
        "social_media" => 5,
        _ => 0,
    };
    let contact_points = match (has_email, has_phone) {
        (true, true) => 10,
        (false, true) => 5,
        _ => 0,
    };

    (budget_points + timeline_points + source_points + contact_points).min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> LeadSubmission {
        LeadSubmission {
            name: Some("Sara Al Mansoori".into()),
            email: Some("sara@example.ae".into()),
            phone: Some("+971 50 123 4567".into()),
            project_type: Some("Villa Renovation".into()),
            budget: Some("luxury".into()),
            locale: Some("ar".into()),
            ..LeadSubmission::default()
        }
    }

    #[test]
    fn test_valid_submission() {
        let lead = validate_submission(&submission()).unwrap();
        assert_eq!(lead.name, "Sara Al Mansoori");
        assert_eq!(lead.locale, "ar");
        assert_eq!(lead.source, "website");
        assert_eq!(lead.status, LeadStatus::New);
        // luxury 20 + website 10 + email and phone 10
        assert_eq!(lead.score, 40);
        assert_eq!(lead.timeline, None);
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let sub = LeadSubmission {
            email: Some("  ".into()),
            project_type: None,
            ..submission()
        };
        match validate_submission(&sub) {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "Missing required fields: email, projectType");
            }
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_email_rejected() {
        let sub = LeadSubmission {
            email: Some("sara@example".into()),
            ..submission()
        };
        match validate_submission(&sub) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid email format"),
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_phone_rejected() {
        let sub = LeadSubmission {
            phone: Some("call me".into()),
            ..submission()
        };
        assert!(matches!(validate_submission(&sub), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_unknown_locale_defaults_to_english() {
        let sub = LeadSubmission {
            locale: Some("fr".into()),
            ..submission()
        };
        assert_eq!(validate_submission(&sub).unwrap().locale, "en");
    }

    #[test]
    fn test_lead_score_is_capped() {
        assert_eq!(lead_score(None, None, "instagram", false, false), 0);
        assert_eq!(lead_score(None, None, "walk_in", false, true), 20);
        assert_eq!(
            lead_score(Some("ultra_luxury"), Some("immediate"), "referral", true, true),
            85
        );
        assert!(lead_score(Some("ultra_luxury"), Some("immediate"), "referral", true, true) <= 100);
    }
}
