//! Typed failures surfaced by the parser, the artifact query engine, the
//! transport, and the client that ties them together.
//!
//! Parsing and filtering never hand back sentinel values: callers always get
//! either a fully-built value or one of these errors.

use thiserror::Error;

/// A self-description document could not be turned into a [`SelfDescription`].
///
/// `path` is the JSON-LD key path of the offending node, e.g.
/// `ids:resourceCatalog[1].ids:offeredResource[0].ids:representation[0]`.
///
/// [`SelfDescription`]: crate::SelfDescription
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing required field `{path}`")]
    MissingField { path: String },

    #[error("field `{path}` has unexpected shape (expected {expected})")]
    UnexpectedShape { path: String, expected: &'static str },

    #[error("field `{path}` has no element at index {index}")]
    IndexOutOfRange { path: String, index: usize },

    #[error("self-description is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// The artifact query could not be evaluated. Any of these aborts the whole
/// call; no partial result list is returned.
#[derive(Debug, Error)]
pub enum FilterEvaluationError {
    #[error("contract offer of artifact {artifact} declares no `@type`")]
    MissingOfferType { artifact: String },

    #[error("contract offer text is not a JSON object: {source}")]
    MalformedContractOffer {
        #[source]
        source: serde_json::Error,
    },

    #[error("contract offer text must be a JSON object")]
    ContractOfferNotObject,

    #[error("artifact {artifact} has no creation timestamp to compare against")]
    MissingCreated { artifact: String },

    #[error("{field} `{value}` does not match %Y-%m-%dT%H:%M:%S.%fZ (one to six fraction digits)")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// Failures raised by the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("expected status {expected} from {url}, got {actual}; body: {body}")]
    UnexpectedStatus {
        url: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("response from {url} (status {status}) does not contain a JSON body")]
    NotJson { url: String, status: u16 },

    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Everything [`TsgClient`](crate::TsgClient) can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("error connecting to the TSG connector: {0}")]
    Connection(#[source] TransportError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("error creating self-description: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Filter(#[from] FilterEvaluationError),

    #[error("no metadata broker url configured")]
    MissingBrokerUrl,

    #[error("unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse { endpoint: String, reason: String },

    /// Writing a downloaded artifact to disk failed.
    #[error("saving artifact: {0:#}")]
    Persistence(#[from] anyhow::Error),
}
