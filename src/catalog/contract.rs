//! Structured contract offers.
//!
//! An offer is kept as the JSON object it was parsed from. Its textual form is
//! canonical JSON (sorted keys, no insignificant whitespace), which parses back
//! into an equal offer.

use crate::catalog::identity::OfferType;
use crate::error::FilterEvaluationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractOffer(Map<String, Value>);

impl ContractOffer {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Parse the canonical text form produced by [`ContractOffer::to_canonical_string`].
    pub fn from_text(text: &str) -> Result<Self, FilterEvaluationError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|source| FilterEvaluationError::MalformedContractOffer { source })?;
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(FilterEvaluationError::ContractOfferNotObject),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("@id").and_then(Value::as_str)
    }

    pub fn offer_type(&self) -> Option<OfferType> {
        self.0
            .get("@type")
            .and_then(Value::as_str)
            .map(OfferType::from_str)
    }

    /// Raw `@value` of `ids:contractStart`.
    pub fn contract_start(&self) -> Option<&str> {
        self.wrapped_value("ids:contractStart")
    }

    /// Raw `@value` of `ids:contractEnd`.
    pub fn contract_end(&self) -> Option<&str> {
        self.wrapped_value("ids:contractEnd")
    }

    pub fn to_canonical_string(&self) -> String {
        sorted_keys(&Value::Object(self.0.clone())).to_string()
    }

    fn wrapped_value(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|node| node.get("@value"))
            .and_then(Value::as_str)
    }
}

/// Rebuild `value` with every object's keys in ascending order. Map iteration
/// order depends on serde_json's `preserve_order` feature.
fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut entries: Vec<_> = fields.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, nested)| (key.clone(), sorted_keys(nested)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}
