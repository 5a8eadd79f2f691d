//! Notification mail over SMTP.
//!
//! Sending is best-effort everywhere: callers log failures and carry on.
//! With no SMTP host configured the mailer is disabled and every send is
//! skipped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::Value;
use uuid::Uuid;

use crate::config::MailConfig;
use crate::content::Locale;
use crate::db::models::LeadRow;
use crate::error::{AppError, AppResult};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    admin_recipients: Vec<String>,
    site_name: String,
}

impl Mailer {
    pub fn new(config: &MailConfig, site_name: &str) -> AppResult<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| AppError::Config(format!("invalid SMTP_FROM address: {}", e)))?;

        let transport = match config.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => Some(build_transport(config, host)?),
            _ => {
                tracing::info!("SMTP not configured, notification mail disabled");
                None
            }
        };

        Ok(Self {
            transport,
            from,
            admin_recipients: config.admin_recipient_list(),
            site_name: site_name.to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send one message to every recipient. Returns `false` when skipped.
    pub async fn send(&self, recipients: &[String], email: &Email) -> AppResult<bool> {
        let Some(transport) = &self.transport else {
            tracing::debug!(subject = %email.subject, "Mail disabled, skipping");
            return Ok(false);
        };
        if recipients.is_empty() {
            tracing::debug!(subject = %email.subject, "No recipients, skipping");
            return Ok(false);
        }

        let mut builder = Message::builder().from(self.from.clone()).subject(&email.subject);
        for recipient in recipients {
            let mailbox: Mailbox = recipient.parse().map_err(|e| {
                AppError::BadRequest(format!("invalid recipient {}: {}", recipient, e))
            })?;
            builder = builder.to(mailbox);
        }
        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| AppError::Internal(format!("failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP send failed: {}", e)))?;

        tracing::info!(subject = %email.subject, recipients = recipients.len(), "Mail sent");
        Ok(true)
    }

    /// Tell the sales team about a new lead and thank the customer.
    pub async fn notify_new_lead(&self, lead: &LeadRow, client_ip: Option<&str>) -> AppResult<()> {
        let notice = lead_admin_email(&self.site_name, lead, client_ip);
        self.send(&self.admin_recipients, &notice).await?;

        if let Some(address) = lead.email.as_deref() {
            let ack = lead_acknowledgment_email(&self.site_name, lead);
            self.send(&[address.to_string()], &ack).await?;
        }
        Ok(())
    }
}

fn build_transport(
    config: &MailConfig,
    host: &str,
) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = match config.port {
        465 => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
        25 | 1025 => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
        _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
    }
    .map_err(|e| AppError::Config(format!("invalid SMTP host {}: {}", host, e)))?;

    let mut builder = builder.port(config.port).timeout(Some(SMTP_TIMEOUT));
    if let (Some(user), Some(password)) = (&config.user, &config.password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    tracing::info!(host = %host, port = config.port, "SMTP transport configured");
    Ok(builder.build())
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `projectType` becomes `Project Type`.
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else if c == '_' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding:8px;border:1px solid #ddd;\"><strong>{}:</strong></td>\
         <td style=\"padding:8px;border:1px solid #ddd;\">{}</td></tr>",
        escape_html(label),
        escape_html(value)
    )
}

fn wrap(title: &str, body: &str, rtl: bool) -> String {
    let dir = if rtl { "rtl" } else { "ltr" };
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head>\
         <body style=\"font-family:Arial,sans-serif;line-height:1.6;color:#333;\">\
         <div dir=\"{dir}\" style=\"max-width:600px;margin:0 auto;padding:20px;\">\
         <h2>{title}</h2>{body}</div></body></html>",
        dir = dir,
        title = escape_html(title),
        body = body
    )
}

pub fn lead_admin_email(site_name: &str, lead: &LeadRow, client_ip: Option<&str>) -> Email {
    let language = match Locale::from_param(Some(lead.locale.as_str())) {
        Locale::Ar => "Arabic",
        Locale::En => "English",
    };

    let rows = [
        row("Name", &lead.name),
        row("Email", lead.email.as_deref().unwrap_or("Not provided")),
        row("Phone", &lead.phone),
        row("Project Type", &lead.project_type),
        row("Budget", lead.budget.as_deref().unwrap_or("Not specified")),
        row("Timeline", lead.timeline.as_deref().unwrap_or("Not specified")),
        row("City", lead.city.as_deref().unwrap_or("Not specified")),
        row("Language", language),
        row("Source", &lead.source),
        row("Message", lead.message.as_deref().unwrap_or("No additional message")),
    ]
    .concat();

    let footer = format!(
        "<p style=\"color:#6c757d;font-size:13px;\">Lead {} from IP {} at {}</p>",
        lead.id,
        escape_html(client_ip.unwrap_or("unknown")),
        lead.created_at.to_rfc3339()
    );

    Email {
        subject: format!("New Lead: {} - {}", lead.name, lead.project_type),
        html: wrap(
            &format!("New lead from the {} website", site_name),
            &format!("<table style=\"width:100%;border-collapse:collapse;\">{}</table>{}", rows, footer),
            false,
        ),
    }
}

pub fn lead_acknowledgment_email(site_name: &str, lead: &LeadRow) -> Email {
    let name = escape_html(&lead.name);
    let project = escape_html(&lead.project_type);
    let phone = escape_html(&lead.phone);

    match Locale::from_param(Some(lead.locale.as_str())) {
        Locale::Ar => {
            let budget = escape_html(lead.budget.as_deref().unwrap_or("غير محدد"));
            Email {
                subject: format!("شكراً لتواصلكم - {}", site_name),
                html: wrap(
                    "شكراً لتواصلكم معنا!",
                    &format!(
                        "<p>عزيزي/عزيزتي {name}،</p>\
                         <p>تم استلام طلبكم للاستشارة وسيقوم فريقنا بالتواصل معكم خلال 24 ساعة.</p>\
                         <ul><li>نوع المشروع: {project}</li><li>الميزانية: {budget}</li>\
                         <li>رقم الهاتف: {phone}</li></ul>"
                    ),
                    true,
                ),
            }
        }
        Locale::En => {
            let budget = escape_html(lead.budget.as_deref().unwrap_or("Not specified"));
            Email {
                subject: format!("Thank You - {}", site_name),
                html: wrap(
                    "Thank you for your interest!",
                    &format!(
                        "<p>Dear {name},</p>\
                         <p>We have received your consultation request and our team will contact you within 24 hours.</p>\
                         <ul><li>Project Type: {project}</li><li>Budget: {budget}</li>\
                         <li>Phone: {phone}</li></ul>"
                    ),
                    false,
                ),
            }
        }
    }
}

/// Notification for a dynamic form submission. Keys of an object payload
/// become table rows in their stored order.
pub fn form_submission_email(
    subject: &str,
    form_name: &str,
    submission_id: Uuid,
    submitted_at: DateTime<Utc>,
    data: &Value,
) -> Email {
    let rows = match data {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| row(&humanize_key(key), &display_value(value)))
            .collect::<String>(),
        other => row("Data", &display_value(other)),
    };

    let body = format!(
        "<p>A new form submission has been received.</p>\
         <p><strong>Form:</strong> {}</p>\
         <p><strong>Submission ID:</strong> {}</p>\
         <p><strong>Date:</strong> {}</p>\
         <h3>Submission Details</h3>\
         <table style=\"width:100%;border-collapse:collapse;\">{}</table>",
        escape_html(form_name),
        submission_id,
        submitted_at.to_rfc3339(),
        rows
    );

    Email {
        subject: subject.to_string(),
        html: wrap(subject, &body, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead(locale: &str) -> LeadRow {
        LeadRow {
            id: Uuid::nil(),
            name: "Sara <b>".into(),
            email: Some("sara@example.com".into()),
            phone: "+971501234567".into(),
            company: None,
            project_type: "Villa Renovation".into(),
            budget: None,
            timeline: None,
            city: Some("Dubai".into()),
            message: None,
            locale: locale.into(),
            source: "website".into(),
            status: "new".into(),
            qualified: false,
            score: 0,
            notes: None,
            form_submission_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("projectType"), "Project Type");
        assert_eq!(humanize_key("email"), "Email");
        assert_eq!(humanize_key("preferred_date"), "Preferred date");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_admin_email_escapes_fields() {
        let email = lead_admin_email("Studio", &lead("en"), Some("10.0.0.1"));
        assert_eq!(email.subject, "New Lead: Sara <b> - Villa Renovation");
        assert!(email.html.contains("Sara &lt;b&gt;"));
        assert!(!email.html.contains("Sara <b>"));
        assert!(email.html.contains("Not specified"));
        assert!(email.html.contains("10.0.0.1"));
    }

    #[test]
    fn test_acknowledgment_follows_locale() {
        let en = lead_acknowledgment_email("Studio", &lead("en"));
        assert_eq!(en.subject, "Thank You - Studio");
        assert!(en.html.contains("dir=\"ltr\""));

        let ar = lead_acknowledgment_email("Studio", &lead("ar"));
        assert!(ar.subject.starts_with("شكراً"));
        assert!(ar.html.contains("dir=\"rtl\""));
        assert!(ar.html.contains("غير محدد"));
    }

    #[test]
    fn test_form_email_lists_fields() {
        let email = form_submission_email(
            "New Form Submission",
            "Consultation",
            Uuid::nil(),
            Utc::now(),
            &json!({ "fullName": "Omar", "rooms": 3 }),
        );
        assert!(email.html.contains("Full Name:"));
        assert!(email.html.contains("Omar"));
        assert!(email.html.contains(">3<"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_skips() {
        let mailer = Mailer::new(&MailConfig::default(), "Studio").unwrap();
        assert!(!mailer.is_enabled());
        let sent = mailer
            .send(&["ops@example.com".to_string()], &lead_acknowledgment_email("Studio", &lead("en")))
            .await
            .unwrap();
        assert!(!sent);
    }
}
