//! Client library for TNO Security Gateway (TSG) dataspace connectors.
//!
//! The crate reads the IDS self-descriptions connectors publish into typed
//! catalogs ([`SelfDescription`]), answers artifact queries over them
//! ([`filter_artifacts`]), and drives a connector's core container API through
//! [`TsgClient`]. The helper binaries under `src/bin/` are thin wrappers over
//! these calls.

pub mod broker;
pub mod catalog;
pub mod client;
pub mod config;
pub mod contract_template;
pub mod endpoints;
pub mod error;
pub mod logging;
pub mod password;
pub mod persistence;
pub mod query;
pub mod schema_loader;
pub mod transport;

pub use broker::{BrokerConnector, summarize_connectors};
pub use catalog::{
    ArtifactId, CatalogId, CatalogIndex, ConnectorId, ContractOffer, OfferType, OfferedResource,
    ResourceCatalog, ResourceEndpoint, SelfDescription,
};
pub use client::{ArtifactRequest, ArtifactUpload, OpenApiRequest, TransferOutcome, TsgClient};
pub use config::ConnectorConfig;
pub use contract_template::{ContractTemplate, save_contract};
pub use error::{ClientError, FilterEvaluationError, ParseError, TransportError};
pub use password::{PasswordHasher, Sha256PasswordHasher};
pub use persistence::SavedFile;
pub use query::{ArtifactDescriptor, ArtifactFilter, filter_artifacts, is_contract_valid, parse_timestamp};
pub use transport::{Body, FormPart, HttpTransport, Method, RequestController, RequestOptions, Response};
