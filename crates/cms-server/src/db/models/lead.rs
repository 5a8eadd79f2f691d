//! CRM lead models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Pipeline stage of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Won,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "qualified" => Ok(LeadStatus::Qualified),
            "proposal" => Ok(LeadStatus::Proposal),
            "won" => Ok(LeadStatus::Won),
            "lost" => Ok(LeadStatus::Lost),
            other => Err(format!("unknown lead status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRow {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub company: Option<String>,
    pub project_type: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub city: Option<String>,
    pub message: Option<String>,
    pub locale: String,
    pub source: String,
    pub status: String,
    pub qualified: bool,
    pub score: i32,
    pub notes: Option<String>,
    pub form_submission_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadActivityRow {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub kind: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Body of the public `POST /api/leads`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, alias = "budgetRange")]
    pub budget: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Validated column values for a new lead.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub company: Option<String>,
    pub project_type: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub city: Option<String>,
    pub message: Option<String>,
    pub locale: String,
    pub source: String,
    pub status: LeadStatus,
    pub qualified: bool,
    pub score: i32,
    pub notes: Option<String>,
    pub form_submission_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadAccepted {
    pub success: bool,
    pub message: String,
    pub lead_id: Uuid,
}

/// Body of `PATCH /api/leads/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadUpdateRequest {
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub qualified: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityCreateRequest {
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadListQuery {
    #[serde(default)]
    pub status: Option<LeadStatus>,
}

/// Lead with its activity timeline.
#[derive(Debug, Clone, Serialize)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: LeadRow,
    pub activities: Vec<LeadActivityRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Qualified".parse::<LeadStatus>(), Ok(LeadStatus::Qualified));
        assert!("archived".parse::<LeadStatus>().is_err());
        assert_eq!(LeadStatus::default().as_str(), "new");
    }

    #[test]
    fn test_submission_accepts_budget_range_alias() {
        let body: LeadSubmission = serde_json::from_value(serde_json::json!({
            "name": "Sara",
            "projectType": "Villa",
            "budgetRange": "500k+"
        }))
        .unwrap();
        assert_eq!(body.budget.as_deref(), Some("500k+"));
        assert_eq!(body.project_type.as_deref(), Some("Villa"));
    }
}
