//! Google Tag Manager account inventory.
//!
//! Tag Manager has no per-day data. A sync lists the containers of the
//! account and the tags, triggers and variables of each container's first
//! workspace.

use async_trait::async_trait;
use serde::Deserialize;

use super::{last_segment, GoogleClient};
use crate::error::ConnectorError;
use crate::records::{GtmContainer, GtmItem, GtmItemKind, SourceKind, SyncRecord};
use crate::source::{verification_outcome, SyncSource};
use crate::window::DateWindow;

const BASE_URL: &str = "https://tagmanager.googleapis.com/tagmanager/v2";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/tagmanager.readonly"];

#[derive(Debug, Default, Deserialize)]
struct ContainerList {
    #[serde(default)]
    container: Vec<RawContainer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawContainer {
    pub path: Option<String>,
    pub container_id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub public_id: Option<String>,
    #[serde(default)]
    pub usage_context: Vec<String>,
    #[serde(default)]
    pub domain_name: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspaceList {
    #[serde(default)]
    workspace: Vec<RawWorkspace>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWorkspace {
    path: Option<String>,
}

/// Tags, triggers and variables share enough shape to decode as one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawItem {
    pub path: Option<String>,
    pub tag_id: Option<String>,
    pub trigger_id: Option<String>,
    pub variable_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub firing_trigger_id: Vec<String>,
    #[serde(default)]
    pub paused: bool,
    pub notes: Option<String>,
    pub parameter: Option<serde_json::Value>,
    pub filter: Option<serde_json::Value>,
    pub custom_event_filter: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemList {
    #[serde(default)]
    tag: Vec<RawItem>,
    #[serde(default)]
    trigger: Vec<RawItem>,
    #[serde(default)]
    variable: Vec<RawItem>,
}

/// Convert a container, falling back to the path's last segment for the id.
pub(crate) fn convert_container(raw: RawContainer) -> Option<GtmContainer> {
    let container_id = raw
        .container_id
        .or_else(|| raw.path.as_deref().and_then(last_segment).map(str::to_string))?;
    Some(GtmContainer {
        container_id,
        name: raw.name,
        public_id: raw.public_id,
        usage_context: raw.usage_context,
        domain_name: raw.domain_name,
        notes: raw.notes,
    })
}

pub(crate) fn convert_item(kind: GtmItemKind, container_id: &str, raw: RawItem) -> Option<GtmItem> {
    let own_id = match kind {
        GtmItemKind::Tag => raw.tag_id,
        GtmItemKind::Trigger => raw.trigger_id,
        GtmItemKind::Variable => raw.variable_id,
    };
    let item_id = own_id.or_else(|| raw.path.as_deref().and_then(last_segment).map(str::to_string))?;

    let config = match kind {
        GtmItemKind::Trigger => serde_json::json!({
            "filter": raw.filter,
            "customEventFilter": raw.custom_event_filter,
        }),
        _ => raw.parameter.unwrap_or(serde_json::Value::Null),
    };

    Some(GtmItem {
        kind,
        container_id: container_id.to_string(),
        item_id,
        name: raw.name,
        item_type: raw.item_type,
        firing_trigger_ids: raw.firing_trigger_id,
        paused: raw.paused,
        notes: raw.notes,
        config,
    })
}

/// A Tag Manager account, addressed as `accounts/{id}`.
pub struct TagManagerSource {
    client: GoogleClient,
    account_path: String,
}

impl TagManagerSource {
    pub fn new(client: GoogleClient, account_path: &str) -> Result<Self, ConnectorError> {
        let account_path = account_path.trim().trim_end_matches('/');
        let valid = account_path
            .strip_prefix("accounts/")
            .map(|id| !id.is_empty() && !id.contains('/'))
            .unwrap_or(false);
        if !valid {
            return Err(ConnectorError::Config(format!(
                "Tag Manager account must look like 'accounts/123', got '{}'",
                account_path
            )));
        }
        Ok(Self {
            client,
            account_path: account_path.to_string(),
        })
    }

    async fn list_containers(&self) -> Result<Vec<RawContainer>, ConnectorError> {
        let url = format!("{}/{}/containers", BASE_URL, self.account_path);
        let list: ContainerList = self.client.get_json(&url, &[], SCOPES).await?;
        Ok(list.container)
    }

    async fn first_workspace(&self, container_path: &str) -> Result<Option<String>, ConnectorError> {
        let url = format!("{}/{}/workspaces", BASE_URL, container_path);
        let list: WorkspaceList = self.client.get_json(&url, &[], SCOPES).await?;
        Ok(list.workspace.into_iter().find_map(|w| w.path))
    }

    async fn list_items(
        &self,
        workspace_path: &str,
        kind: GtmItemKind,
    ) -> Result<Vec<RawItem>, ConnectorError> {
        let collection = match kind {
            GtmItemKind::Tag => "tags",
            GtmItemKind::Trigger => "triggers",
            GtmItemKind::Variable => "variables",
        };
        let url = format!("{}/{}/{}", BASE_URL, workspace_path, collection);
        let list: ItemList = self.client.get_json(&url, &[], SCOPES).await?;
        Ok(match kind {
            GtmItemKind::Tag => list.tag,
            GtmItemKind::Trigger => list.trigger,
            GtmItemKind::Variable => list.variable,
        })
    }
}

#[async_trait]
impl SyncSource for TagManagerSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Gtm
    }

    async fn fetch_window(&self, _window: &DateWindow) -> Result<Vec<SyncRecord>, ConnectorError> {
        let mut records = Vec::new();

        for raw in self.list_containers().await? {
            let path = raw.path.clone();
            let Some(container) = convert_container(raw) else {
                tracing::warn!(account = %self.account_path, "skipping container without an id");
                continue;
            };
            let container_path = path.unwrap_or_else(|| {
                format!("{}/containers/{}", self.account_path, container.container_id)
            });
            let container_id = container.container_id.clone();
            records.push(SyncRecord::GtmContainer(container));

            let Some(workspace) = self.first_workspace(&container_path).await? else {
                tracing::debug!(container = %container_id, "container has no workspace");
                continue;
            };

            for kind in [GtmItemKind::Tag, GtmItemKind::Trigger, GtmItemKind::Variable] {
                let items = self.list_items(&workspace, kind).await?;
                tracing::debug!(container = %container_id, kind = kind.as_str(), count = items.len(), "fetched tag manager items");
                records.extend(
                    items
                        .into_iter()
                        .filter_map(|raw| convert_item(kind, &container_id, raw))
                        .map(SyncRecord::GtmItem),
                );
            }
        }

        Ok(records)
    }

    async fn verify(&self) -> Result<bool, ConnectorError> {
        verification_outcome(self.list_containers().await.map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_container_id_falls_back_to_path() {
        let raw: RawContainer = serde_json::from_value(json!({
            "path": "accounts/6001/containers/9912",
            "name": "Main site",
            "publicId": "GTM-ABC123",
            "usageContext": ["web"]
        }))
        .unwrap();
        let container = convert_container(raw).unwrap();
        assert_eq!(container.container_id, "9912");
        assert_eq!(container.public_id.as_deref(), Some("GTM-ABC123"));
        assert!(container.domain_name.is_empty());
    }

    #[test]
    fn test_convert_tag() {
        let raw: RawItem = serde_json::from_value(json!({
            "path": "accounts/1/containers/2/workspaces/3/tags/14",
            "tagId": "14",
            "name": "GA4 config",
            "type": "gaawc",
            "firingTriggerId": ["2147479553"],
            "parameter": [{ "key": "measurementId", "type": "template", "value": "G-XYZ" }]
        }))
        .unwrap();
        let tag = convert_item(GtmItemKind::Tag, "2", raw).unwrap();
        assert_eq!(tag.item_id, "14");
        assert_eq!(tag.item_type, "gaawc");
        assert_eq!(tag.firing_trigger_ids, vec!["2147479553"]);
        assert!(!tag.paused);
        assert_eq!(tag.config[0]["value"], "G-XYZ");
    }

    #[test]
    fn test_convert_trigger_keeps_filters() {
        let raw: RawItem = serde_json::from_value(json!({
            "path": "accounts/1/containers/2/workspaces/3/triggers/8",
            "name": "Form submit",
            "type": "formSubmission",
            "filter": [{ "type": "contains" }]
        }))
        .unwrap();
        let trigger = convert_item(GtmItemKind::Trigger, "2", raw).unwrap();
        assert_eq!(trigger.item_id, "8");
        assert_eq!(trigger.config["filter"][0]["type"], "contains");
        assert!(trigger.config["customEventFilter"].is_null());
    }

    #[test]
    fn test_item_without_id_is_dropped() {
        let raw = RawItem::default();
        assert!(convert_item(GtmItemKind::Variable, "2", raw).is_none());
    }

    #[test]
    fn test_account_path_validation() {
        let client = GoogleClient::new(Arc::new(StaticToken("t".into()))).unwrap();
        assert!(TagManagerSource::new(client.clone(), "accounts/6001").is_ok());
        assert!(TagManagerSource::new(client.clone(), "accounts/").is_err());
        assert!(TagManagerSource::new(client, "accounts/1/containers/2").is_err());
    }
}
