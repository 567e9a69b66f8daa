//! Contract-offer templates for publishing artifacts.
//!
//! A template renders the minimal `ids:ContractOffer` TSG connectors accept:
//! the IDS context, one permission granting USE and READ, and a
//! `dateTimeStamp` validity window.

use crate::schema_loader::validate_contract_offer;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CONTRACT_OFFER_BASE: &str = "https://w3id.org/idsa/autogen/contractOffer";
const PERMISSION_ID: &str =
    "https://w3id.org/idsa/autogen/permission/15f85a6b-f921-47fd-b541-3f8367998048";
const DATE_TIME_STAMP: &str = "http://www.w3.org/2001/XMLSchema#dateTimeStamp";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractTemplate {
    pub contract_id: String,
    /// `%Y-%m-%dT%H:%M:%S.%fZ` with one to six fraction digits, e.g. `2024-01-01T00:00:00.000Z`.
    pub contract_start: String,
    pub contract_end: String,
}

impl ContractTemplate {
    pub fn new(
        contract_id: impl Into<String>,
        contract_start: impl Into<String>,
        contract_end: impl Into<String>,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            contract_start: contract_start.into(),
            contract_end: contract_end.into(),
        }
    }

    /// Template with a random v4 UUID as contract id.
    pub fn with_random_id(contract_start: impl Into<String>, contract_end: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), contract_start, contract_end)
    }

    pub fn render(&self) -> Value {
        json!({
            "@context": {
                "ids": "https://w3id.org/idsa/core/",
                "idsc": "https://w3id.org/idsa/code/"
            },
            "@type": "ids:ContractOffer",
            "@id": format!("{CONTRACT_OFFER_BASE}/{}", self.contract_id),
            "ids:permission": [{
                "@type": "ids:Permission",
                "@id": PERMISSION_ID,
                "ids:action": [
                    {"@id": "https://w3id.org/idsa/code/USE"},
                    {"@id": "https://w3id.org/idsa/code/READ"}
                ]
            }],
            "ids:contractStart": {
                "@value": self.contract_start,
                "@type": DATE_TIME_STAMP
            },
            "ids:contractEnd": {
                "@value": self.contract_end,
                "@type": DATE_TIME_STAMP
            }
        })
    }

    /// Render and check against the bundled schema.
    pub fn validated(&self) -> Result<Value> {
        let rendered = self.render();
        validate_contract_offer(&rendered)
            .with_context(|| format!("contract template {}", self.contract_id))?;
        Ok(rendered)
    }

    pub fn file_name(&self) -> String {
        format!("contract_{}.json", self.contract_id)
    }
}

/// Validate `template` and write it pretty-printed to
/// `<dir>/contract_<id>.json`, creating `dir` when needed.
pub fn save_contract(template: &ContractTemplate, dir: &Path) -> Result<PathBuf> {
    let rendered = template.validated()?;
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(template.file_name());
    let text = serde_json::to_string_pretty(&rendered)?;
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "saved contract template");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ContractOffer, OfferType};
    use tempfile::TempDir;

    fn template() -> ContractTemplate {
        ContractTemplate::new(
            "abc",
            "2024-01-01T00:00:00.000Z",
            "2024-12-31T23:59:59.000Z",
        )
    }

    #[test]
    fn rendered_offer_reads_back_as_contract_offer() {
        let rendered = template().validated().expect("template is valid");
        let offer = ContractOffer::from_text(&rendered.to_string()).expect("object");
        assert_eq!(offer.offer_type(), Some(OfferType::ContractOffer));
        assert_eq!(
            offer.id(),
            Some("https://w3id.org/idsa/autogen/contractOffer/abc")
        );
        assert_eq!(offer.contract_start(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(offer.contract_end(), Some("2024-12-31T23:59:59.000Z"));
    }

    #[test]
    fn malformed_window_fails_validation() {
        let bad = ContractTemplate::new("abc", "tomorrow", "2024-12-31T23:59:59.000Z");
        let err = bad.validated().expect_err("start is not a timestamp");
        assert!(format!("{err:#}").contains("contract template abc"));
    }

    #[test]
    fn window_needs_fractional_seconds() {
        for end in ["2024-12-31T23:59:59Z", "2024-12-31T23:59:59.1234567Z"] {
            let bad = ContractTemplate::new("abc", "2024-01-01T00:00:00.000Z", end);
            assert!(bad.validated().is_err(), "{end} should be rejected");
        }
    }

    #[test]
    fn save_creates_directory_and_names_file_after_id() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("docs").join("contracts");
        let path = save_contract(&template(), &target).expect("saved");
        assert_eq!(path, target.join("contract_abc.json"));
        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, template().render());
    }

    #[test]
    fn random_ids_differ() {
        let a = ContractTemplate::with_random_id("s", "e");
        let b = ContractTemplate::with_random_id("s", "e");
        assert_ne!(a.contract_id, b.contract_id);
    }
}
