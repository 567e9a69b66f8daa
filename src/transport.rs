//! HTTP transport for the connector APIs.
//!
//! [`RequestController`] is the blocking reqwest implementation: it composes
//! `<base_url>/<endpoint>`, attaches the bearer token to every call, and checks
//! the expected status code and JSON body when asked to. [`HttpTransport`] is
//! the seam the client talks to, so tests can swap in an in-memory fake.

use crate::error::TransportError;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Json(Value),
    /// Sent as multipart/form-data.
    Form(Vec<FormPart>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Per-request knobs. Everything is optional.
pub struct RequestOptions {
    pub params: Vec<(String, String)>,
    pub body: Option<Body>,
    pub headers: Vec<(String, String)>,
    /// Replaces the controller's base URL for this request.
    pub base_url: Option<String>,
    pub expected_status: Option<u16>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn form(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(Body::Form(parts));
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = Some(status);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Fully-read HTTP response.
pub struct Response {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Media type of the body without parameters, e.g. `application/json`
    /// for `application/json; charset=UTF-8`.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Verb-based access to a connector API.
pub trait HttpTransport {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response, TransportError>;

    fn get(&self, endpoint: &str, options: RequestOptions) -> Result<Response, TransportError> {
        self.request(Method::Get, endpoint, options)
    }

    fn post(&self, endpoint: &str, options: RequestOptions) -> Result<Response, TransportError> {
        self.request(Method::Post, endpoint, options)
    }

    fn put(&self, endpoint: &str, options: RequestOptions) -> Result<Response, TransportError> {
        self.request(Method::Put, endpoint, options)
    }

    fn patch(&self, endpoint: &str, options: RequestOptions) -> Result<Response, TransportError> {
        self.request(Method::Patch, endpoint, options)
    }

    fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<Response, TransportError> {
        self.request(Method::Delete, endpoint, options)
    }
}

/// Apply the expected-status contract to a response.
///
/// A status other than `expected` is an error. A matching status must carry a
/// JSON body, except for DELETE, where connectors often answer with nothing.
pub fn validate_response(
    method: Method,
    url: &str,
    expected: Option<u16>,
    response: &Response,
) -> Result<(), TransportError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if response.status != expected {
        return Err(TransportError::UnexpectedStatus {
            url: url.to_string(),
            expected,
            actual: response.status,
            body: response.text(),
        });
    }
    if method != Method::Delete && response.json().is_err() {
        return Err(TransportError::NotJson {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(())
}

/// Blocking HTTP controller bound to one connector.
pub struct RequestController {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for RequestController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestController")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RequestController {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| TransportError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, extra: &[(String, String)]) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in extra {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|err| TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|err| {
            TransportError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: err.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

impl HttpTransport for RequestController {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response, TransportError> {
        let base_url = options.base_url.as_deref().unwrap_or(&self.base_url);
        let url = format!("{base_url}/{endpoint}");
        debug!(%method, %url, params = ?options.params, "sending request");

        let mut builder = self
            .client
            .request(method.to_reqwest(), &url)
            .headers(self.headers(&options.headers)?);
        if !options.params.is_empty() {
            builder = builder.query(&options.params);
        }
        builder = match options.body {
            Some(Body::Json(value)) => builder.json(&value),
            Some(Body::Form(parts)) => builder.multipart(multipart_form(parts)),
            None => builder,
        };

        let http_error = |source| TransportError::Http {
            url: url.clone(),
            source,
        };
        let raw = builder.send().map_err(http_error)?;
        let status = raw.status().as_u16();
        let headers = raw
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = raw.bytes().map_err(http_error)?.to_vec();
        debug!(%method, %url, status, "received response");

        let response = Response::new(status, headers, body);
        validate_response(method, &url, options.expected_status, &response)?;
        Ok(response)
    }
}

fn multipart_form(parts: Vec<FormPart>) -> Form {
    parts.into_iter().fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => form.text(name, value),
        FormPart::File {
            name,
            file_name,
            bytes,
        } => form.part(name, Part::bytes(bytes).file_name(file_name)),
    })
}
