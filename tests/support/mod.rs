use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tsg_client::transport::validate_response;
use tsg_client::{
    ConnectorConfig, HttpTransport, Method, RequestOptions, Response, SelfDescription,
    TransportError, TsgClient,
};

pub const CONNECTOR_ID: &str = "urn:ids:enershare:connectors:connector-01";
pub const AGENT_ID: &str = "urn:ids:enershare:participants:agent-01";
pub const ACCESS_URL: &str = "https://connector-01.example";
pub const BROKER_URL: &str = "https://broker.example";

pub fn mocks_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("mocks")
}

pub fn fixture_value() -> Result<Value> {
    let path = mocks_dir().join("self_description.json");
    let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn fixture() -> Result<SelfDescription> {
    Ok(SelfDescription::parse(&fixture_value()?)?)
}

pub fn config() -> ConnectorConfig {
    ConnectorConfig {
        api_key: "test-api-key".to_string(),
        connector_id: CONNECTOR_ID.to_string(),
        access_url: ACCESS_URL.to_string(),
        agent_id: AGENT_ID.to_string(),
        metadata_broker_url: Some(BROKER_URL.to_string()),
    }
}

pub fn json_response(status: u16, body: &Value) -> Response {
    response(status, "application/json", body.to_string().into_bytes())
}

pub fn response(status: u16, content_type: &str, body: Vec<u8>) -> Response {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), content_type.to_string());
    Response::new(status, headers, body)
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub options: RequestOptions,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.options
            .params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.options
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory transport. Routes are keyed by method and endpoint; anything
/// unrouted answers 404 with an empty body. Expected-status checks run the
/// same way they do over HTTP.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<BTreeMap<(String, String), Response>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    /// A transport that already passes the connection check.
    pub fn reachable() -> Self {
        Self::default().route(
            Method::Get,
            "api/resources",
            json_response(200, &serde_json::json!([])),
        )
    }

    pub fn route(self, method: Method, endpoint: &str, response: Response) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method.as_str().to_string(), endpoint.to_string()), response);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request.
    pub fn last(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one request")
    }
}

impl HttpTransport for FakeTransport {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response, TransportError> {
        let base = options.base_url.clone().unwrap_or_else(|| ACCESS_URL.to_string());
        let url = format!("{base}/{endpoint}");
        let expected = options.expected_status;
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            endpoint: endpoint.to_string(),
            options,
        });
        let reply = self
            .routes
            .lock()
            .unwrap()
            .get(&(method.as_str().to_string(), endpoint.to_string()))
            .cloned()
            .unwrap_or_else(|| response(404, "text/plain", Vec::new()));
        validate_response(method, &url, expected, &reply)?;
        Ok(reply)
    }
}

pub fn client(transport: FakeTransport) -> TsgClient<FakeTransport> {
    TsgClient::with_transport(config(), transport).expect("fake transport is reachable")
}
