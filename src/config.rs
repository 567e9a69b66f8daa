//! Connector settings shared by the binaries.
//!
//! Values come from the process environment. Binaries load `.env` first with
//! `dotenv`, so a file next to the working directory behaves like exported
//! variables.

use anyhow::{Result, bail};
use std::env;

pub const API_KEY: &str = "API_KEY";
pub const CONNECTOR_ID: &str = "CONNECTOR_ID";
pub const ACCESS_URL: &str = "ACCESS_URL";
pub const AGENT_ID: &str = "AGENT_ID";
pub const METADATA_BROKER_URL: &str = "METADATA_BROKER_URL";

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub api_key: String,
    pub connector_id: String,
    /// Base URL of our own connector's core container API.
    pub access_url: String,
    pub agent_id: String,
    pub metadata_broker_url: Option<String>,
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("api_key", &"<redacted>")
            .field("connector_id", &self.connector_id)
            .field("access_url", &self.access_url)
            .field("agent_id", &self.agent_id)
            .field("metadata_broker_url", &self.metadata_broker_url)
            .finish()
    }
}

impl ConnectorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |key: &'static str| {
            value(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };
        let api_key = required(API_KEY);
        let connector_id = required(CONNECTOR_ID);
        let access_url = required(ACCESS_URL);
        let agent_id = required(AGENT_ID);
        if !missing.is_empty() {
            bail!(
                "missing connector settings: {} (set them in the environment or .env)",
                missing.join(", ")
            );
        }

        Ok(Self {
            api_key,
            connector_id,
            access_url: access_url.trim_end_matches('/').to_string(),
            agent_id,
            metadata_broker_url: value(METADATA_BROKER_URL)
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_required_and_optional_settings() {
        let config = ConnectorConfig::from_lookup(lookup(&[
            (API_KEY, "key"),
            (CONNECTOR_ID, "urn:ids:c"),
            (ACCESS_URL, "https://c.example/"),
            (AGENT_ID, "urn:ids:agent"),
            (METADATA_BROKER_URL, "https://broker.example"),
        ]))
        .expect("complete config");
        assert_eq!(config.access_url, "https://c.example");
        assert_eq!(
            config.metadata_broker_url.as_deref(),
            Some("https://broker.example")
        );
        assert!(format!("{config:?}").contains("<redacted>"));
    }

    #[test]
    fn reports_every_missing_setting() {
        let err = ConnectorConfig::from_lookup(lookup(&[(API_KEY, "key"), (AGENT_ID, "  ")]))
            .expect_err("incomplete");
        let message = err.to_string();
        assert!(message.contains("CONNECTOR_ID"));
        assert!(message.contains("ACCESS_URL"));
        assert!(message.contains("AGENT_ID"));
        assert!(!message.contains("API_KEY"));
    }

    #[test]
    fn broker_url_is_optional() {
        let config = ConnectorConfig::from_lookup(lookup(&[
            (API_KEY, "key"),
            (CONNECTOR_ID, "urn:ids:c"),
            (ACCESS_URL, "https://c.example"),
            (AGENT_ID, "urn:ids:agent"),
        ]))
        .expect("complete config");
        assert!(config.metadata_broker_url.is_none());
    }
}
