use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Connector identifier as published in a self-description (`@id`), e.g.
/// `urn:ids:enershare:connectors:connector-02`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(pub String);

/// Identifier of a resource catalog inside a self-description.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub String);

/// Stable identifier of an offered artifact.
///
/// For resources with a contract offer this is the id of the first
/// representation instance; otherwise it is the resource's own `@id`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

/// Suffix TSG connectors append to their id for the data-app catalog.
const DATA_APP_SUFFIX: &str = ":data-app";

impl ConnectorId {
    /// Id of the catalog holding this connector's data apps.
    pub fn data_app_catalog(&self) -> CatalogId {
        CatalogId(format!("{}{DATA_APP_SUFFIX}", self.0))
    }
}

impl CatalogId {
    pub fn is_data_app(&self) -> bool {
        self.0.ends_with(DATA_APP_SUFFIX)
    }
}

impl ArtifactId {
    /// File-system friendly form: surrounding whitespace trimmed and `:`
    /// replaced by `_`.
    pub fn file_stem(&self) -> String {
        self.0.trim().replace(':', "_")
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declared `@type` of a contract offer.
///
/// Known IDS variants keep matching consistent; `Other` carries any type a
/// connector introduces that this crate does not name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfferType {
    ContractOffer,
    ContractRequest,
    ContractAgreement,
    Other(String),
}

impl Serialize for OfferType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OfferType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

impl OfferType {
    pub fn as_str(&self) -> &str {
        match self {
            OfferType::ContractOffer => "ids:ContractOffer",
            OfferType::ContractRequest => "ids:ContractRequest",
            OfferType::ContractAgreement => "ids:ContractAgreement",
            OfferType::Other(value) => value.as_str(),
        }
    }

    pub(crate) fn from_str(value: &str) -> Self {
        match value {
            "ids:ContractOffer" => OfferType::ContractOffer,
            "ids:ContractRequest" => OfferType::ContractRequest,
            "ids:ContractAgreement" => OfferType::ContractAgreement,
            other => OfferType::Other(other.to_string()),
        }
    }
}
