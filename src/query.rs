//! Artifact queries over a parsed self-description.
//!
//! `filter_artifacts` walks catalogs and their offered resources in document
//! order and applies the filters set on an [`ArtifactFilter`]. Resources
//! without a contract offer are never returned. Contract offers that cannot be
//! evaluated for a requested filter abort the whole query, with one exception:
//! an unreadable validity window only drops that resource.
//!
//! The current time is a parameter so results are reproducible.

use crate::catalog::{ArtifactId, CatalogId, ContractOffer, OfferedResource, SelfDescription};
use crate::error::FilterEvaluationError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Timestamp layout used by TSG for `ids:created`, `ids:contractStart` and
/// `ids:contractEnd`, e.g. `2024-03-19T21:47:18.009Z`. The fraction is
/// mandatory and holds one to six digits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

const MAX_FRACTION_DIGITS: usize = 6;

#[derive(Clone, Debug, Default)]
/// Filters applied by [`filter_artifacts`]. The default keeps every resource
/// that carries a contract offer.
pub struct ArtifactFilter {
    pub catalog_id: Option<CatalogId>,
    /// Exact `@type` the contract offer must declare.
    pub resource_type: Option<String>,
    /// Exclusive lower bound on `created`.
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created`.
    pub created_before: Option<DateTime<Utc>>,
    /// Keep only the last offered resource of each catalog.
    pub last_only: bool,
    /// Keep only resources whose contract window contains the query time.
    pub valid_contract_only: bool,
}

impl ArtifactFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(mut self, id: impl Into<String>) -> Self {
        self.catalog_id = Some(CatalogId(id.into()));
        self
    }

    pub fn resource_type(mut self, declared: impl Into<String>) -> Self {
        self.resource_type = Some(declared.into());
        self
    }

    pub fn created_after(mut self, bound: DateTime<Utc>) -> Self {
        self.created_after = Some(bound);
        self
    }

    pub fn created_before(mut self, bound: DateTime<Utc>) -> Self {
        self.created_before = Some(bound);
        self
    }

    pub fn last_only(mut self) -> Self {
        self.last_only = true;
        self
    }

    pub fn valid_contract_only(mut self) -> Self {
        self.valid_contract_only = true;
        self
    }

    fn has_date_bounds(&self) -> bool {
        self.created_after.is_some() || self.created_before.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Caller-facing summary of one artifact that passed the filters.
pub struct ArtifactDescriptor {
    pub id: ArtifactId,
    /// Canonical JSON text of the contract offer.
    pub contract_offer: String,
    pub artifact_created: Option<String>,
    pub access_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ArtifactDescriptor {
    fn from_resource(resource: &OfferedResource, offer: &ContractOffer) -> Self {
        Self {
            id: resource.artifact_id.clone(),
            contract_offer: offer.to_canonical_string(),
            artifact_created: resource.created.clone(),
            access_url: resource.access_url().map(str::to_string),
            title: resource.title.clone(),
            description: resource.description.clone(),
        }
    }

    /// Structured form of [`ArtifactDescriptor::contract_offer`].
    pub fn parsed_contract_offer(&self) -> Result<ContractOffer, FilterEvaluationError> {
        ContractOffer::from_text(&self.contract_offer)
    }
}

/// Parse a timestamp in [`TIMESTAMP_FORMAT`]; `field` names the value in the
/// error.
pub fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, FilterEvaluationError> {
    let invalid = || FilterEvaluationError::InvalidTimestamp {
        field,
        value: value.to_string(),
    };
    // chrono's `%.f` also accepts no fraction or up to nine digits.
    if !has_fraction(value) {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

fn has_fraction(value: &str) -> bool {
    value
        .strip_suffix('Z')
        .and_then(|rest| rest.rsplit_once('.'))
        .is_some_and(|(_, fraction)| {
            (1..=MAX_FRACTION_DIGITS).contains(&fraction.len())
                && fraction.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Whether `now` lies inside the offer's `[contractStart, contractEnd]`
/// window, both ends inclusive. A missing or unreadable window is invalid.
pub fn is_contract_valid(offer: &ContractOffer, now: DateTime<Utc>) -> bool {
    let (Some(start), Some(end)) = (offer.contract_start(), offer.contract_end()) else {
        warn!(offer = offer.id().unwrap_or_default(), "contract offer has no validity window");
        return false;
    };
    match (
        parse_timestamp("ids:contractStart", start),
        parse_timestamp("ids:contractEnd", end),
    ) {
        (Ok(start), Ok(end)) => start <= now && now <= end,
        (Err(err), _) | (_, Err(err)) => {
            warn!(offer = offer.id().unwrap_or_default(), "invalid contract date: {err}");
            false
        }
    }
}

/// Select the artifacts of `description` that pass `filter`, in document
/// order (catalogs first, then resources within each catalog).
pub fn filter_artifacts(
    description: &SelfDescription,
    filter: &ArtifactFilter,
    now: DateTime<Utc>,
) -> Result<Vec<ArtifactDescriptor>, FilterEvaluationError> {
    let mut artifacts = Vec::new();

    for catalog in &description.catalogs {
        if let Some(wanted) = &filter.catalog_id {
            if &catalog.id != wanted {
                continue;
            }
        }
        let last = catalog.offered_resources.last();

        for resource in &catalog.offered_resources {
            let Some(offer) = &resource.contract_offer else {
                warn!(
                    catalog = %catalog.id,
                    artifact = %resource.artifact_id,
                    "skipping resource without contract offer"
                );
                continue;
            };

            if let Some(expected) = &filter.resource_type {
                let declared =
                    offer
                        .offer_type()
                        .ok_or_else(|| FilterEvaluationError::MissingOfferType {
                            artifact: resource.artifact_id.0.clone(),
                        })?;
                if declared.as_str() != expected {
                    continue;
                }
            }

            if filter.has_date_bounds() {
                let created = created_at(resource)?;
                if filter.created_after.is_some_and(|after| created <= after) {
                    continue;
                }
                if filter.created_before.is_some_and(|before| created >= before) {
                    continue;
                }
            }

            if filter.last_only && !last.is_some_and(|last| std::ptr::eq(last, resource)) {
                continue;
            }

            if filter.valid_contract_only && !is_contract_valid(offer, now) {
                continue;
            }

            artifacts.push(ArtifactDescriptor::from_resource(resource, offer));
        }
    }

    debug!(
        connector = %description.id,
        matched = artifacts.len(),
        "filtered catalog artifacts"
    );
    Ok(artifacts)
}

fn created_at(resource: &OfferedResource) -> Result<DateTime<Utc>, FilterEvaluationError> {
    let created =
        resource
            .created
            .as_deref()
            .ok_or_else(|| FilterEvaluationError::MissingCreated {
                artifact: resource.artifact_id.0.clone(),
            })?;
    parse_timestamp("ids:created", created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn at(value: &str) -> DateTime<Utc> {
        parse_timestamp("test", value).expect("fixture timestamp")
    }

    fn resource(name: &str, created: &str, offer_type: &str, start: &str, end: &str) -> Value {
        json!({
            "@id": format!("urn:resource:{name}"),
            "ids:title": [{"@value": name}],
            "ids:created": {"@value": created},
            "ids:contractOffer": [{
                "@type": offer_type,
                "@id": format!("urn:offer:{name}"),
                "ids:contractStart": {"@value": start},
                "ids:contractEnd": {"@value": end}
            }],
            "ids:representation": [{"ids:instance": [{"@id": format!("urn:artifact:{name}")}]}]
        })
    }

    fn offered(name: &str, created: &str) -> Value {
        resource(
            name,
            created,
            "ids:ContractOffer",
            "2024-01-01T00:00:00.000Z",
            "2024-12-31T00:00:00.000Z",
        )
    }

    fn description(catalogs: Value) -> SelfDescription {
        SelfDescription::parse(&json!({
            "@id": "urn:connector",
            "ids:title": [{"@value": "c"}],
            "ids:description": [{"@value": "c"}],
            "ids:securityProfile": {"@id": "p"},
            "ids:curator": {"@id": "cur"},
            "ids:maintainer": {"@id": "main"},
            "ids:hasDefaultEndpoint": {"ids:accessURL": {"@id": "https://c.example"}},
            "ids:resourceCatalog": catalogs
        }))
        .expect("fixture parses")
    }

    fn ids(artifacts: &[ArtifactDescriptor]) -> Vec<&str> {
        artifacts.iter().map(|a| a.id.0.as_str()).collect()
    }

    fn two_catalogs() -> SelfDescription {
        description(json!([
            {
                "@id": "urn:catalog:a",
                "ids:offeredResource": [
                    offered("a1", "2024-03-01T00:00:00.000Z"),
                    {"@id": "urn:resource:bare"},
                    offered("a2", "2024-03-02T00:00:00.000Z")
                ]
            },
            {
                "@id": "urn:catalog:b",
                "ids:offeredResource": [
                    offered("b1", "2024-03-03T00:00:00.000Z"),
                    offered("b2", "2024-03-04T00:00:00.000Z")
                ]
            }
        ]))
    }

    #[test]
    fn no_filters_returns_every_offered_resource_in_order() {
        let sd = two_catalogs();
        let artifacts = filter_artifacts(&sd, &ArtifactFilter::new(), Utc::now()).unwrap();
        assert_eq!(
            ids(&artifacts),
            vec!["urn:artifact:a1", "urn:artifact:a2", "urn:artifact:b1", "urn:artifact:b2"]
        );
    }

    #[test]
    fn catalog_filter_selects_single_catalog() {
        let sd = two_catalogs();
        let artifacts =
            filter_artifacts(&sd, &ArtifactFilter::new().catalog("urn:catalog:b"), Utc::now())
                .unwrap();
        assert_eq!(ids(&artifacts), vec!["urn:artifact:b1", "urn:artifact:b2"]);

        let none = filter_artifacts(&sd, &ArtifactFilter::new().catalog("urn:catalog:x"), Utc::now())
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn last_only_keeps_one_per_catalog() {
        let sd = two_catalogs();
        let artifacts =
            filter_artifacts(&sd, &ArtifactFilter::new().last_only(), Utc::now()).unwrap();
        assert_eq!(ids(&artifacts), vec!["urn:artifact:a2", "urn:artifact:b2"]);
    }

    #[test]
    fn last_only_yields_nothing_when_catalog_ends_without_offer() {
        let sd = description(json!([{
            "@id": "urn:catalog:a",
            "ids:offeredResource": [
                offered("a1", "2024-03-01T00:00:00.000Z"),
                {"@id": "urn:resource:bare"}
            ]
        }]));
        let artifacts =
            filter_artifacts(&sd, &ArtifactFilter::new().last_only(), Utc::now()).unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn date_bounds_are_exclusive() {
        let sd = two_catalogs();
        let filter = ArtifactFilter::new()
            .created_after(at("2024-03-01T00:00:00.000Z"))
            .created_before(at("2024-03-04T00:00:00.000Z"));
        let artifacts = filter_artifacts(&sd, &filter, Utc::now()).unwrap();
        assert_eq!(ids(&artifacts), vec!["urn:artifact:a2", "urn:artifact:b1"]);
    }

    #[test]
    fn date_filter_requires_created() {
        let mut raw = offered("x", "2024-03-01T00:00:00.000Z");
        raw.as_object_mut().unwrap().remove("ids:created");
        let sd = description(json!([{"@id": "urn:catalog:a", "ids:offeredResource": [raw]}]));

        let unfiltered = filter_artifacts(&sd, &ArtifactFilter::new(), Utc::now()).unwrap();
        assert_eq!(unfiltered.len(), 1);

        let filter = ArtifactFilter::new().created_after(at("2024-01-01T00:00:00.000Z"));
        assert!(matches!(
            filter_artifacts(&sd, &filter, Utc::now()),
            Err(FilterEvaluationError::MissingCreated { .. })
        ));
    }

    #[test]
    fn resource_type_must_match_exactly() {
        let sd = description(json!([{
            "@id": "urn:catalog:a",
            "ids:offeredResource": [
                offered("a1", "2024-03-01T00:00:00.000Z"),
                resource("a2", "2024-03-02T00:00:00.000Z", "ids:ContractRequest",
                    "2024-01-01T00:00:00.000Z", "2024-12-31T00:00:00.000Z")
            ]
        }]));
        let requests = filter_artifacts(
            &sd,
            &ArtifactFilter::new().resource_type("ids:ContractRequest"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(ids(&requests), vec!["urn:artifact:a2"]);

        let none =
            filter_artifacts(&sd, &ArtifactFilter::new().resource_type("ContractOffer"), Utc::now())
                .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn missing_offer_type_is_fatal_under_type_filter() {
        let mut raw = offered("x", "2024-03-01T00:00:00.000Z");
        raw["ids:contractOffer"][0].as_object_mut().unwrap().remove("@type");
        let sd = description(json!([{"@id": "urn:catalog:a", "ids:offeredResource": [raw]}]));
        assert!(filter_artifacts(&sd, &ArtifactFilter::new(), Utc::now()).is_ok());
        assert!(matches!(
            filter_artifacts(
                &sd,
                &ArtifactFilter::new().resource_type("ids:ContractOffer"),
                Utc::now()
            ),
            Err(FilterEvaluationError::MissingOfferType { .. })
        ));
    }

    #[test]
    fn validity_window_is_inclusive() {
        let sd = two_catalogs();
        let filter = ArtifactFilter::new().valid_contract_only();

        for now in ["2024-01-01T00:00:00.000Z", "2024-06-15T12:00:00.000Z", "2024-12-31T00:00:00.000Z"] {
            let artifacts = filter_artifacts(&sd, &filter, at(now)).unwrap();
            assert_eq!(artifacts.len(), 4, "window should include {now}");
        }
        for now in ["2023-12-31T23:59:59.999Z", "2024-12-31T00:00:00.001Z"] {
            let artifacts = filter_artifacts(&sd, &filter, at(now)).unwrap();
            assert!(artifacts.is_empty(), "window should exclude {now}");
        }
    }

    #[test]
    fn unreadable_contract_dates_exclude_without_error() {
        let sd = description(json!([{
            "@id": "urn:catalog:a",
            "ids:offeredResource": [
                resource("bad", "2024-03-01T00:00:00.000Z", "ids:ContractOffer",
                    "2024-01-01T00:00:00.000+00:00", "2024-12-31T00:00:00.000Z"),
                offered("good", "2024-03-02T00:00:00.000Z")
            ]
        }]));
        let artifacts = filter_artifacts(
            &sd,
            &ArtifactFilter::new().valid_contract_only(),
            at("2024-06-01T00:00:00.000Z"),
        )
        .unwrap();
        assert_eq!(ids(&artifacts), vec!["urn:artifact:good"]);
    }

    #[test]
    fn descriptor_contract_offer_round_trips() {
        let sd = two_catalogs();
        let artifacts = filter_artifacts(&sd, &ArtifactFilter::new(), Utc::now()).unwrap();
        let offer = artifacts[0].parsed_contract_offer().unwrap();
        assert_eq!(offer.id(), Some("urn:offer:a1"));
        assert_eq!(
            &offer,
            sd.catalogs[0].offered_resources[0].contract_offer.as_ref().unwrap()
        );
    }

    #[test]
    fn parse_timestamp_rejects_other_layouts() {
        assert!(parse_timestamp("bound", "2024-03-19T21:47:18.009Z").is_ok());
        assert!(parse_timestamp("bound", "2024-03-19T21:47:18.1Z").is_ok());
        assert!(parse_timestamp("bound", "2024-03-19T21:47:18.123456Z").is_ok());
        for value in [
            "19/03/2024",
            "2024-03-19T21:47:18Z",
            "2024-03-19T21:47:18.Z",
            "2024-03-19T21:47:18.1234567Z",
            "2024-03-19T21:47:18.123456789Z",
            "2024-03-19T21:47:18.009",
        ] {
            assert!(
                matches!(
                    parse_timestamp("bound", value),
                    Err(FilterEvaluationError::InvalidTimestamp { field: "bound", .. })
                ),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn contract_dates_with_bad_fraction_are_excluded() {
        let sd = description(json!([{
            "@id": "urn:catalog:a",
            "ids:offeredResource": [
                resource("whole", "2024-03-01T00:00:00.000Z", "ids:ContractOffer",
                    "2024-01-01T00:00:00Z", "2024-12-31T00:00:00.000Z"),
                resource("nanos", "2024-03-01T00:00:00.000Z", "ids:ContractOffer",
                    "2024-01-01T00:00:00.000Z", "2024-12-31T00:00:00.123456789Z"),
                offered("good", "2024-03-02T00:00:00.000Z")
            ]
        }]));
        let artifacts = filter_artifacts(
            &sd,
            &ArtifactFilter::new().valid_contract_only(),
            at("2024-06-01T00:00:00.000Z"),
        )
        .unwrap();
        assert_eq!(ids(&artifacts), vec!["urn:artifact:good"]);
    }
}
