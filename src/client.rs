//! High-level client for a TSG connector.
//!
//! [`TsgClient`] owns the connector settings and a transport. It turns the
//! core container's REST surface into typed calls: fetching and querying
//! self-descriptions, negotiating agreements, moving artifacts in and out,
//! forwarding OpenAPI calls to data apps, and a few administrative endpoints.

use crate::broker::{BrokerConnector, summarize_connectors};
use crate::catalog::{ArtifactId, CatalogIndex, SelfDescription};
use crate::config::ConnectorConfig;
use crate::endpoints;
use crate::error::ClientError;
use crate::password::{PasswordHasher, Sha256PasswordHasher};
use crate::persistence::{SavedFile, save_csv_file, save_json_file, save_pdf_file, save_text_file};
use crate::query::{ArtifactDescriptor, ArtifactFilter, filter_artifacts};
use crate::transport::{Body, FormPart, HttpTransport, Method, RequestController, RequestOptions, Response};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Parameters of an artifact download from another connector.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactRequest {
    pub artifact_id: ArtifactId,
    /// Artifact access URL from the provider's self-description.
    pub access_url: String,
    pub connector_id: String,
    pub agent_id: String,
    /// Contract agreement id returned by [`TsgClient::request_agreement`].
    pub transfer_contract: String,
    /// Save by content type (`.json`, `.pdf`, `.csv`) instead of as `.txt`.
    pub keep_original_format: bool,
    pub dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransferOutcome {
    Saved(SavedFile),
    /// Nothing was written; the provider answered with a media type we do not
    /// save in its original format.
    Unsupported { content_type: Option<String> },
}

/// Artifact payload plus the metadata TSG stores with it.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub title: String,
    pub description: String,
    /// Contract offer JSON text.
    pub contract_offer: String,
}

impl ArtifactUpload {
    /// Read the artifact body from `path`; the file name becomes the upload
    /// name.
    pub fn from_path(
        path: &Path,
        title: impl Into<String>,
        description: impl Into<String>,
        contract_offer: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("artifact")
            .to_string();
        Ok(Self {
            file_name,
            content,
            title: title.into(),
            description: description.into(),
            contract_offer: contract_offer.into(),
        })
    }

    fn into_form(self) -> Vec<FormPart> {
        vec![
            FormPart::File {
                name: "artifact".to_string(),
                file_name: self.file_name,
                bytes: self.content,
            },
            FormPart::text("title", self.title),
            FormPart::text("description", self.description),
            FormPart::text("contractOffer", self.contract_offer),
        ]
    }
}

/// Call to a data app's REST API, forwarded through our connector.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenApiRequest {
    pub access_url: String,
    pub connector_id: String,
    pub api_version: String,
    /// Path on the data app, without leading slash.
    pub endpoint: String,
    pub method: Method,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl OpenApiRequest {
    pub fn get(
        access_url: impl Into<String>,
        connector_id: impl Into<String>,
        api_version: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            access_url: access_url.into(),
            connector_id: connector_id.into(),
            api_version: api_version.into(),
            endpoint: endpoint.into(),
            method: Method::Get,
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }
}

pub struct TsgClient<T: HttpTransport = RequestController> {
    config: ConnectorConfig,
    transport: T,
    hasher: Box<dyn PasswordHasher>,
}

impl TsgClient<RequestController> {
    /// Connect to our own connector over HTTP.
    pub fn connect(config: ConnectorConfig) -> Result<Self, ClientError> {
        let transport = RequestController::new(&config.access_url, &config.api_key)
            .map_err(ClientError::Connection)?;
        Self::with_transport(config, transport)
    }
}

impl<T: HttpTransport> TsgClient<T> {
    /// Wrap an existing transport and check that the core container answers
    /// with this API key.
    pub fn with_transport(config: ConnectorConfig, transport: T) -> Result<Self, ClientError> {
        transport
            .get(endpoints::RESOURCES, RequestOptions::new().expect_status(200))
            .map_err(ClientError::Connection)?;
        debug!(connector = %config.connector_id, "connected to core container");
        Ok(Self {
            config,
            transport,
            hasher: Box::new(Sha256PasswordHasher),
        })
    }

    pub fn with_password_hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Self-description of another participant's connector.
    pub fn get_connector_self_description(
        &self,
        connector_id: &str,
        access_url: &str,
        agent_id: &str,
    ) -> Result<SelfDescription, ClientError> {
        let options = RequestOptions::new()
            .param("connectorId", connector_id)
            .param("accessUrl", access_url)
            .param("agentId", agent_id)
            .expect_status(200);
        let response = self.transport.get(endpoints::DESCRIPTION, options)?;
        self.parse_self_description(endpoints::DESCRIPTION, &response)
    }

    /// Self-description of our own connector.
    pub fn get_own_self_description(&self) -> Result<SelfDescription, ClientError> {
        let response = self.transport.get(
            endpoints::SELF_DESCRIPTION,
            RequestOptions::new().expect_status(200),
        )?;
        self.parse_self_description(endpoints::SELF_DESCRIPTION, &response)
    }

    fn parse_self_description(
        &self,
        endpoint: &str,
        response: &Response,
    ) -> Result<SelfDescription, ClientError> {
        let raw = json_body(endpoint, response)?;
        let description = SelfDescription::parse(&raw).inspect_err(|err| {
            warn!(endpoint, "error creating self-description: {err}");
        })?;
        Ok(description)
    }

    /// See [`filter_artifacts`].
    pub fn parse_catalog_artifacts(
        &self,
        description: &SelfDescription,
        filter: &ArtifactFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArtifactDescriptor>, ClientError> {
        Ok(filter_artifacts(description, filter, now)?)
    }

    /// Ask the provider for a contract agreement on `contract_offer` and
    /// return the agreement id.
    pub fn request_agreement(
        &self,
        connector_id: &str,
        artifact_access_url: &str,
        contract_offer: &str,
    ) -> Result<String, ClientError> {
        let form = vec![
            FormPart::text("connectorId", connector_id),
            FormPart::text("agentId", ""),
            FormPart::text("contractOffer", contract_offer),
            FormPart::text("accessUrl", artifact_access_url),
        ];
        let response = self.transport.post(
            endpoints::CONTRACT_REQUEST,
            RequestOptions::new().form(form),
        )?;
        let body = json_body(endpoints::CONTRACT_REQUEST, &response)?;
        let agreement = body
            .get("@id")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::UnexpectedResponse {
                endpoint: endpoints::CONTRACT_REQUEST.to_string(),
                reason: "agreement has no @id".to_string(),
            })?;
        info!(agreement, "contract agreement concluded");
        Ok(agreement.to_string())
    }

    /// Download an artifact under an agreement and save it to
    /// `request.dir`.
    pub fn request_data_artifact(
        &self,
        request: &ArtifactRequest,
    ) -> Result<TransferOutcome, ClientError> {
        let options = RequestOptions::new()
            .param("artifact", request.artifact_id.0.as_str())
            .param("connectorId", request.connector_id.as_str())
            .param("agentId", request.agent_id.as_str())
            .param("accessUrl", request.access_url.as_str())
            .param("transferContract", request.transfer_contract.as_str());
        let response = self.transport.get(endpoints::ARTIFACTS_CONSUMER, options)?;

        let stem = request.artifact_id.file_stem();
        if !request.keep_original_format {
            let saved = save_text_file(&stem, &response.text(), &request.dir)?;
            return Ok(TransferOutcome::Saved(saved));
        }

        let saved = match response.content_type() {
            Some("application/json") => save_json_file(&stem, &response.text(), &request.dir)?,
            Some("application/pdf") => save_pdf_file(&stem, response.bytes(), &request.dir)?,
            Some("text/csv") => save_csv_file(&stem, &response.text(), &request.dir)?,
            other => {
                warn!(artifact = %request.artifact_id, content_type = ?other, "unsupported format");
                return Ok(TransferOutcome::Unsupported {
                    content_type: other.map(str::to_string),
                });
            }
        };
        Ok(TransferOutcome::Saved(saved))
    }

    /// Publish a new artifact on our connector.
    pub fn publish_data_artifact(&self, upload: ArtifactUpload) -> Result<Value, ClientError> {
        let response = self.transport.post(
            endpoints::ARTIFACTS_PROVIDER,
            RequestOptions::new().form(upload.into_form()),
        )?;
        json_body(endpoints::ARTIFACTS_PROVIDER, &response)
    }

    /// Replace an artifact we already publish.
    pub fn edit_artifact(
        &self,
        artifact_id: &str,
        upload: ArtifactUpload,
    ) -> Result<Value, ClientError> {
        let endpoint = endpoints::with_encoded_id(endpoints::ARTIFACTS_PROVIDER, artifact_id);
        let response = self
            .transport
            .put(&endpoint, RequestOptions::new().form(upload.into_form()))?;
        json_body(&endpoint, &response)
    }

    pub fn delete_artifact(&self, artifact_id: &str) -> Result<(), ClientError> {
        let endpoint = endpoints::with_encoded_id(endpoints::ARTIFACTS_PROVIDER, artifact_id);
        self.transport
            .delete(&endpoint, RequestOptions::new().expect_status(200))?;
        info!(artifact = artifact_id, "artifact deleted");
        Ok(())
    }

    /// Documentation URLs of the data apps in `description` serving
    /// `api_version`.
    pub fn get_openapi_specs(&self, description: &SelfDescription, api_version: &str) -> Vec<String> {
        CatalogIndex::new(description).openapi_documentation(api_version)
    }

    /// Forward a call to another connector's data app. The response is
    /// returned as-is.
    pub fn openapi_request(&self, request: OpenApiRequest) -> Result<Response, ClientError> {
        let forward = [
            ("Forward-AccessURL", request.access_url.as_str()),
            ("Forward-Sender", self.config.agent_id.as_str()),
            ("Forward-To", request.connector_id.as_str()),
            ("Forward-Recipient", request.connector_id.as_str()),
        ];
        let mut headers: Vec<(String, String)> = request
            .headers
            .into_iter()
            .filter(|(name, _)| {
                !forward
                    .iter()
                    .any(|(forwarded, _)| forwarded.eq_ignore_ascii_case(name))
            })
            .collect();
        headers.extend(
            forward
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );

        let endpoint = format!(
            "{}/{}/{}",
            endpoints::OPEN_API,
            request.api_version,
            request.endpoint
        );
        let options = RequestOptions {
            params: request.params,
            body: request.body,
            headers,
            base_url: None,
            expected_status: None,
        };
        Ok(self.transport.request(request.method, &endpoint, options)?)
    }

    /// Every connector registered at the configured metadata broker.
    pub fn query_metadata_broker(&self) -> Result<Value, ClientError> {
        let broker = self
            .config
            .metadata_broker_url
            .as_deref()
            .ok_or(ClientError::MissingBrokerUrl)?;
        let response = self.transport.get(
            endpoints::METADATA_BROKER_CONNECTORS,
            RequestOptions::new().base_url(broker).expect_status(200),
        )?;
        json_body(endpoints::METADATA_BROKER_CONNECTORS, &response)
    }

    /// [`query_metadata_broker`](Self::query_metadata_broker), summarized.
    pub fn broker_connectors(&self) -> Result<Vec<BrokerConnector>, ClientError> {
        let listing = self.query_metadata_broker()?;
        summarize_connectors(&listing).map_err(|err| ClientError::UnexpectedResponse {
            endpoint: endpoints::METADATA_BROKER_CONNECTORS.to_string(),
            reason: err.to_string(),
        })
    }

    pub fn get_administrative_users(&self) -> Result<Value, ClientError> {
        let response = self.transport.get(
            endpoints::ADMINISTRATIVE_USERS,
            RequestOptions::new().expect_status(200),
        )?;
        json_body(endpoints::ADMINISTRATIVE_USERS, &response)
    }

    pub fn new_administrative_user(
        &self,
        id: &str,
        password: &str,
        roles: &[String],
    ) -> Result<Response, ClientError> {
        let endpoint = endpoints::with_encoded_id(endpoints::ADMINISTRATIVE_USERS, id);
        let body = json!({
            "password": self.hasher.hash(password),
            "roles": roles,
        });
        Ok(self.transport.post(&endpoint, RequestOptions::new().json(body))?)
    }

    /// Update a user's password and, when given, roles. The connector creates
    /// the user if it does not exist yet.
    pub fn update_administrative_user(
        &self,
        id: &str,
        password: &str,
        roles: Option<&[String]>,
    ) -> Result<Response, ClientError> {
        let endpoint = endpoints::with_encoded_id(endpoints::ADMINISTRATIVE_USERS, id);
        let mut body = json!({ "password": self.hasher.hash(password) });
        if let Some(roles) = roles {
            body["roles"] = json!(roles);
        }
        Ok(self.transport.put(&endpoint, RequestOptions::new().json(body))?)
    }

    pub fn delete_administrative_user(&self, id: &str) -> Result<(), ClientError> {
        let endpoint = endpoints::with_encoded_id(endpoints::ADMINISTRATIVE_USERS, id);
        self.transport
            .delete(&endpoint, RequestOptions::new().expect_status(200))?;
        Ok(())
    }
}

fn json_body(endpoint: &str, response: &Response) -> Result<Value, ClientError> {
    response
        .json()
        .map_err(|err| ClientError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            reason: format!("body is not JSON ({err})"),
        })
}
