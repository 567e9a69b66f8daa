//! Relative paths of the TSG core container and metadata broker APIs.

pub const METADATA_BROKER_CONNECTORS: &str = "api/connectors/full";
pub const SELF_DESCRIPTION: &str = "selfdescription";
pub const DESCRIPTION: &str = "api/description";
pub const RESOURCES: &str = "api/resources";
pub const ARTIFACTS_CONSUMER: &str = "api/artifacts/consumer/artifact";
pub const ARTIFACTS_PROVIDER: &str = "api/artifacts/provider";
pub const CONTRACT_REQUEST: &str = "api/artifacts/consumer/contractRequest";
pub const OPEN_API: &str = "openapi";
pub const ADMINISTRATIVE_USERS: &str = "api/security/users";

/// `<base>/<percent-encoded id>`, encoding every reserved character.
pub fn with_encoded_id(base: &str, id: &str) -> String {
    format!("{base}/{}", urlencoding::encode(id))
}
