//! Outbound mail configuration.

use serde::Deserialize;

/// SMTP settings, prefixed with `SMTP_`.
///
/// Mail is disabled when `SMTP_HOST` is unset; notifications are then
/// logged and skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_from")]
    pub from: String,

    /// Comma separated addresses that receive lead notifications
    #[serde(default)]
    pub admin_recipients: Option<String>,
}

fn default_port() -> u16 {
    587
}

fn default_from() -> String {
    "Studio <no-reply@example.com>".to_string()
}

impl MailConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("SMTP_").from_env::<MailConfig>()
    }

    pub fn is_enabled(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }

    pub fn admin_recipient_list(&self) -> Vec<String> {
        split_recipients(self.admin_recipients.as_deref().unwrap_or_default())
    }
}

/// Split a comma separated address list, dropping blanks.
pub fn split_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            user: None,
            password: None,
            from: default_from(),
            admin_recipients: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_host() {
        let config = MailConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.port, 587);
    }

    #[test]
    fn test_admin_recipients() {
        let config = MailConfig {
            admin_recipients: Some("sales@studio.ae, ,ops@studio.ae".to_string()),
            ..MailConfig::default()
        };
        assert_eq!(
            config.admin_recipient_list(),
            vec!["sales@studio.ae", "ops@studio.ae"]
        );
    }
}
