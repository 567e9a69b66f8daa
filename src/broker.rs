//! Summaries of the connectors registered at a metadata broker.
//!
//! The broker returns full self-descriptions for every registered connector.
//! Clients usually only need enough to address one: its id, where to reach
//! it, which agent maintains it, and which data-app catalogs it offers.

use crate::catalog::{CatalogId, ConnectorId};
use crate::error::ParseError;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Suffix TSG connectors append to their access URL for IDS messages.
const ROUTER_SUFFIX: &str = "/router";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BrokerConnector {
    pub id: ConnectorId,
    /// First endpoint access URL with the `/router` part cut off.
    pub access_url: Option<String>,
    /// `ids:maintainer` of the connector.
    pub agent_id: Option<String>,
    /// Catalog ids containing `data-app`.
    pub data_apps: Vec<CatalogId>,
}

impl BrokerConnector {
    pub fn has_data_apps(&self) -> bool {
        !self.data_apps.is_empty()
    }
}

/// Summarize a broker listing. Entries without an `@id` are skipped.
pub fn summarize_connectors(listing: &Value) -> Result<Vec<BrokerConnector>, ParseError> {
    let entries = listing
        .as_array()
        .ok_or_else(|| ParseError::UnexpectedShape {
            path: "<document>".to_string(),
            expected: "array",
        })?;

    let mut connectors = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let Some(id) = entry.get("@id").and_then(Value::as_str) else {
            warn!(index = idx, "broker entry without @id skipped");
            continue;
        };
        let access_url = entry
            .pointer("/ids:hasEndpoint/0/ids:accessURL/@id")
            .and_then(Value::as_str)
            .map(|url| match url.split_once(ROUTER_SUFFIX) {
                Some((base, _)) => base.to_string(),
                None => url.to_string(),
            });
        let agent_id = entry
            .pointer("/ids:maintainer/@id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let data_apps = entry
            .get("ids:resourceCatalog")
            .and_then(Value::as_array)
            .map(|catalogs| {
                catalogs
                    .iter()
                    .filter_map(|catalog| catalog.get("@id").and_then(Value::as_str))
                    .map(|id| CatalogId(id.to_string()))
                    .filter(|id| id.0.contains("data-app"))
                    .collect()
            })
            .unwrap_or_default();

        connectors.push(BrokerConnector {
            id: ConnectorId(id.to_string()),
            access_url,
            agent_id,
            data_apps,
        });
    }
    Ok(connectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_address_agent_and_data_apps() {
        let listing = json!([
            {
                "@id": "urn:ids:a",
                "ids:hasEndpoint": [{"ids:accessURL": {"@id": "https://a.example/router"}}],
                "ids:maintainer": {"@id": "urn:ids:agent:a"},
                "ids:resourceCatalog": [
                    {"@id": "urn:ids:a:data-app"},
                    {"@id": "urn:ids:a:resources"}
                ]
            },
            {
                "@id": "urn:ids:b",
                "ids:hasEndpoint": [{"ids:accessURL": {"@id": "https://b.example"}}]
            },
            {"title": "no id"}
        ]);
        let connectors = summarize_connectors(&listing).expect("array listing");
        assert_eq!(connectors.len(), 2);

        let a = &connectors[0];
        assert_eq!(a.access_url.as_deref(), Some("https://a.example"));
        assert_eq!(a.agent_id.as_deref(), Some("urn:ids:agent:a"));
        assert_eq!(a.data_apps, vec![CatalogId("urn:ids:a:data-app".into())]);
        assert!(a.has_data_apps());

        let b = &connectors[1];
        assert_eq!(b.access_url.as_deref(), Some("https://b.example"));
        assert!(b.agent_id.is_none());
        assert!(!b.has_data_apps());
    }

    #[test]
    fn non_array_listing_is_rejected() {
        let err = summarize_connectors(&json!({"@id": "x"})).expect_err("object");
        assert!(matches!(err, ParseError::UnexpectedShape { expected: "array", .. }));
    }
}
