//! Self-description model.
//!
//! Wraps the IDS JSON-LD self-description a connector publishes so callers get
//! typed catalogs and offered resources instead of walking raw maps. Use
//! `SelfDescription::parse` to build the model and `CatalogIndex` for
//! catalog-level lookups.

pub mod contract;
pub mod identity;
pub mod index;
pub mod model;

pub use contract::ContractOffer;
pub use identity::{ArtifactId, CatalogId, ConnectorId, OfferType};
pub use index::CatalogIndex;
pub use model::{OfferedResource, ResourceCatalog, ResourceEndpoint, SelfDescription};
