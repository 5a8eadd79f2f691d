//! Server configuration.

use serde::Deserialize;

/// Server configuration loaded from environment variables.
///
/// Environment variables are prefixed with `CMS_`:
/// - `CMS_HOST`: Server bind address (default: "0.0.0.0")
/// - `CMS_PORT`: Server port (default: 8090)
/// - `CMS_ADMIN_TOKEN`: Bearer token required on admin routes (optional)
/// - `CMS_ENCRYPTION_KEY`: Base64 AES-256 key sealing stored credentials
/// - `CMS_LEAD_RATE_LIMIT`: Lead submissions allowed per window (default: 5)
/// - `CMS_LEAD_RATE_WINDOW_SECS`: Rate limit window (default: 900)
/// - `CMS_DEFAULT_SYNC_DAYS`: Days back a sync covers when unspecified (default: 30)
/// - `CMS_CORS_ORIGINS`: Comma separated allowed origins (default: any)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub admin_token: Option<String>,

    #[serde(default)]
    pub encryption_key: Option<String>,

    #[serde(default = "default_lead_rate_limit")]
    pub lead_rate_limit: usize,

    #[serde(default = "default_lead_rate_window_secs")]
    pub lead_rate_window_secs: u64,

    #[serde(default = "default_sync_days")]
    pub default_sync_days: u32,

    #[serde(default)]
    pub cors_origins: Option<String>,

    /// Name used in notification emails
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_lead_rate_limit() -> usize {
    5
}

fn default_lead_rate_window_secs() -> u64 {
    900
}

fn default_sync_days() -> u32 {
    30
}

fn default_site_name() -> String {
    "Studio".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("CMS_").from_env::<AppConfig>()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Admin token, treating an empty value as unset.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Explicit CORS origins; empty means any origin.
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "*")
            .map(str::to_string)
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
            encryption_key: None,
            lead_rate_limit: default_lead_rate_limit(),
            lead_rate_window_secs: default_lead_rate_window_secs(),
            default_sync_days: default_sync_days(),
            cors_origins: None,
            site_name: default_site_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8090");
        assert_eq!(config.lead_rate_limit, 5);
        assert_eq!(config.lead_rate_window_secs, 900);
        assert_eq!(config.default_sync_days, 30);
        assert!(config.admin_token().is_none());
    }

    #[test]
    fn test_blank_admin_token_is_unset() {
        let config = AppConfig {
            admin_token: Some("  ".to_string()),
            ..AppConfig::default()
        };
        assert!(config.admin_token().is_none());
    }

    #[test]
    fn test_cors_origin_list() {
        let config = AppConfig {
            cors_origins: Some("https://studio.ae, https://admin.studio.ae,".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.cors_origin_list(),
            vec!["https://studio.ae", "https://admin.studio.ae"]
        );

        let any = AppConfig {
            cors_origins: Some("*".to_string()),
            ..AppConfig::default()
        };
        assert!(any.cors_origin_list().is_empty());
    }
}
