//! The sync source seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::TokenSource;
use crate::error::ConnectorError;
use crate::google::{
    BusinessProfileSource, Ga4Source, GoogleClient, SearchConsoleSource, TagManagerSource,
    YoutubeSource,
};
use crate::records::{SourceKind, SyncRecord};
use crate::window::DateWindow;

/// A vendor that can be asked for the records of a date window.
///
/// Sources are read-only: they fetch and decode, they never store.
/// Sources without per-day data (Tag Manager, Business Profile) return
/// their full current state and ignore the window.
#[async_trait]
pub trait SyncSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch every record for the window.
    async fn fetch_window(&self, window: &DateWindow) -> Result<Vec<SyncRecord>, ConnectorError>;

    /// Make the cheapest authenticated call the vendor offers.
    ///
    /// Returns `Ok(false)` when the vendor rejects the credentials or the
    /// resource; transport failures are errors.
    async fn verify(&self) -> Result<bool, ConnectorError>;
}

/// Build the source for a property's kind and external id.
pub fn build_source(
    kind: SourceKind,
    external_id: &str,
    tokens: Arc<dyn TokenSource>,
) -> Result<Box<dyn SyncSource>, ConnectorError> {
    let client = GoogleClient::new(tokens)?;
    let source: Box<dyn SyncSource> = match kind {
        SourceKind::Ga4 => Box::new(Ga4Source::new(client, external_id)?),
        SourceKind::Gsc => Box::new(SearchConsoleSource::new(client, external_id)?),
        SourceKind::Gtm => Box::new(TagManagerSource::new(client, external_id)?),
        SourceKind::Gbp => Box::new(BusinessProfileSource::new(client, external_id)?),
        SourceKind::Youtube => Box::new(YoutubeSource::new(client, external_id)?),
    };
    Ok(source)
}

/// Treat a vendor rejection as a failed verification rather than an error.
pub(crate) fn verification_outcome(result: Result<(), ConnectorError>) -> Result<bool, ConnectorError> {
    match result {
        Ok(()) => Ok(true),
        Err(ConnectorError::Auth(msg)) => {
            tracing::warn!(error = %msg, "credential verification rejected");
            Ok(false)
        }
        Err(ConnectorError::Http { status, body }) if (400..500).contains(&status) => {
            tracing::warn!(status, error = %body, "credential verification rejected");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    #[test]
    fn test_verification_outcome() {
        assert!(verification_outcome(Ok(())).unwrap());
        assert!(!verification_outcome(Err(ConnectorError::Auth("no".into()))).unwrap());
        assert!(!verification_outcome(Err(ConnectorError::Http {
            status: 404,
            body: "missing".into()
        }))
        .unwrap());
        assert!(verification_outcome(Err(ConnectorError::Timeout)).is_err());
    }

    #[test]
    fn test_build_source_rejects_malformed_ids() {
        let tokens: Arc<dyn TokenSource> = Arc::new(StaticToken("t".into()));
        assert!(build_source(SourceKind::Gbp, "locations/1", Arc::clone(&tokens)).is_err());
        assert!(build_source(SourceKind::Gtm, "123", Arc::clone(&tokens)).is_err());
        assert!(build_source(SourceKind::Ga4, "", Arc::clone(&tokens)).is_err());

        let source = build_source(SourceKind::Gsc, "sc-domain:example.com", tokens).unwrap();
        assert_eq!(source.kind(), SourceKind::Gsc);
    }
}
