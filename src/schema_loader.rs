//! Bundled JSON Schema for generated contract offers.
//!
//! The schema ships inside the binary so contract templates can be checked
//! without locating a repository checkout at runtime.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;

const CONTRACT_OFFER_SCHEMA: &str = include_str!("../schema/contract_offer.schema.json");

/// Parsed contract-offer schema document.
pub(crate) fn contract_offer_schema() -> Result<Value> {
    serde_json::from_str(CONTRACT_OFFER_SCHEMA).context("parsing bundled contract offer schema")
}

fn compile(schema: &Value, label: &str) -> Result<JSONSchema> {
    JSONSchema::compile(schema).map_err(|err| anyhow!("compiling schema {label}: {err}"))
}

/// Validate `instance` against the bundled contract-offer schema, reporting
/// every violation with its instance path.
pub fn validate_contract_offer(instance: &Value) -> Result<()> {
    let schema = contract_offer_schema()?;
    let compiled = compile(&schema, "contract_offer.schema.json")?;
    if let Err(errors) = compiled.validate(instance) {
        let details: Vec<String> = errors
            .map(|err| format!("{}: {err}", err.instance_path))
            .collect();
        bail!(
            "contract offer does not match schema: {}",
            details.join("; ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundled_schema_compiles() {
        let schema = contract_offer_schema().expect("schema parses");
        compile(&schema, "bundled").expect("schema compiles");
    }

    #[test]
    fn rejects_offer_without_permission() {
        let offer = json!({
            "@context": {
                "ids": "https://w3id.org/idsa/core/",
                "idsc": "https://w3id.org/idsa/code/"
            },
            "@type": "ids:ContractOffer",
            "@id": "https://w3id.org/idsa/autogen/contractOffer/x",
            "ids:contractStart": {
                "@value": "2024-01-01T00:00:00.000Z",
                "@type": "http://www.w3.org/2001/XMLSchema#dateTimeStamp"
            },
            "ids:contractEnd": {
                "@value": "2024-12-31T00:00:00.000Z",
                "@type": "http://www.w3.org/2001/XMLSchema#dateTimeStamp"
            }
        });
        let err = validate_contract_offer(&offer).expect_err("permission is required");
        assert!(err.to_string().contains("ids:permission"));
    }
}
