//! Google API sources.
//!
//! Every source shares one [`GoogleClient`]: a reqwest client plus a
//! token source. Requests carry a bearer token minted for the source's
//! scopes, and non-success statuses become [`ConnectorError`]s.

pub mod business_profile;
pub mod ga4;
pub mod search_console;
pub mod tag_manager;
pub mod youtube;

pub use business_profile::BusinessProfileSource;
pub use ga4::Ga4Source;
pub use search_console::SearchConsoleSource;
pub use tag_manager::TagManagerSource;
pub use youtube::YoutubeSource;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::TokenSource;
use crate::error::ConnectorError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated JSON client shared by the Google sources.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleClient {
    pub fn new(tokens: Arc<dyn TokenSource>) -> Result<Self, ConnectorError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConnectorError::Config(format!("failed to build http client: {}", e)))?;
        Ok(Self { http, tokens })
    }

    /// Build with an existing reqwest client.
    pub fn with_http(http: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self { http, tokens }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        scopes: &[&str],
    ) -> Result<T, ConnectorError> {
        let request = self.http.get(url).query(query);
        self.send(request, scopes).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        scopes: &[&str],
    ) -> Result<T, ConnectorError> {
        let request = self.http.post(url).json(body);
        self.send(request, scopes).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        scopes: &[&str],
    ) -> Result<T, ConnectorError> {
        let token = self.tokens.access_token(scopes).await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }
}

/// Map a failed vendor status onto a connector error.
pub(crate) fn status_error(status: StatusCode, body: String) -> ConnectorError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ConnectorError::Auth(format!("{}: {}", status.as_u16(), vendor_message(&body)))
        }
        StatusCode::TOO_MANY_REQUESTS => ConnectorError::RateLimited,
        _ => ConnectorError::Http {
            status: status.as_u16(),
            body: vendor_message(&body),
        },
    }
}

/// Google wraps failures as `{"error": {"message": ..}}`; pull the message
/// out when it is there.
fn vendor_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Last `/`-separated segment of a resource path.
pub(crate) fn last_segment(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|s| !s.is_empty())
}
