//! Typed view of an IDS self-description document.
//!
//! A TSG connector publishes its identity, catalogs, and offered resources as
//! compacted JSON-LD. The types here pick out the fields clients act on and
//! reject documents whose required fields are missing or mis-shaped; nothing
//! is defaulted silently except the catalog list and each catalog's resource
//! list, which connectors omit when empty.
//!
//! Catalogs and resources keep document order. Nothing here re-sorts them, and
//! the "last artifact" filter in [`crate::query`] depends on that.

use crate::catalog::contract::ContractOffer;
use crate::catalog::identity::{ArtifactId, CatalogId, ConnectorId};
use crate::error::ParseError;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Connector identity plus its resource catalogs.
pub struct SelfDescription {
    pub id: ConnectorId,
    pub title: String,
    pub description: String,
    pub security_profile: String,
    pub curator: String,
    pub maintainer: String,
    /// Access URL of the connector's default endpoint.
    pub default_endpoint: String,
    /// Catalogs in document order.
    pub catalogs: Vec<ResourceCatalog>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Named group of offered resources.
pub struct ResourceCatalog {
    pub id: CatalogId,
    /// Resources in document order.
    pub offered_resources: Vec<OfferedResource>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// One catalog entry: a data artifact or a data app.
pub struct OfferedResource {
    /// The resource's own `@id`.
    pub resource_id: String,
    pub artifact_id: ArtifactId,
    pub contract_offer: Option<ContractOffer>,
    pub created: Option<String>,
    /// Present for data resources, absent for data apps.
    pub endpoint: Option<ResourceEndpoint>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Retrieval details taken from the first `ids:resourceEndpoint` entry.
pub struct ResourceEndpoint {
    /// Endpoint access URL with the relative path appended.
    pub access_url: String,
    pub path: String,
    /// First endpoint documentation `@id`, empty when none is listed.
    pub documentation: String,
}

impl SelfDescription {
    /// Build a self-description from an already decoded document.
    pub fn parse(raw: &Value) -> Result<Self, ParseError> {
        let root = Node::root(raw);
        root.as_object()?;

        let catalogs = match root.get("ids:resourceCatalog") {
            Some(node) => node
                .items()?
                .into_iter()
                .map(ResourceCatalog::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let description = Self {
            id: ConnectorId(root.field("@id")?.as_str()?.to_string()),
            title: root.language_value("ids:title")?,
            description: root.language_value("ids:description")?,
            security_profile: root.wrapped_id("ids:securityProfile")?,
            curator: root.wrapped_id("ids:curator")?,
            maintainer: root.wrapped_id("ids:maintainer")?,
            default_endpoint: root
                .field("ids:hasDefaultEndpoint")?
                .wrapped_id("ids:accessURL")?,
            catalogs,
        };
        debug!(
            connector = %description.id,
            catalogs = description.catalogs.len(),
            "parsed self-description"
        );
        Ok(description)
    }

    /// Decode and parse a self-description from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(text)?;
        Self::parse(&value)
    }
}

impl ResourceCatalog {
    /// Parse a single `ids:ResourceCatalog` node.
    pub fn parse(raw: &Value) -> Result<Self, ParseError> {
        Self::from_node(Node::root(raw))
    }

    fn from_node(node: Node<'_>) -> Result<Self, ParseError> {
        let id = CatalogId(node.field("@id")?.as_str()?.to_string());
        let offered_resources = match node.get("ids:offeredResource") {
            Some(list) => list
                .items()?
                .into_iter()
                .map(OfferedResource::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            id,
            offered_resources,
        })
    }
}

impl OfferedResource {
    /// Parse a single offered resource node.
    pub fn parse(raw: &Value) -> Result<Self, ParseError> {
        Self::from_node(Node::root(raw))
    }

    fn from_node(node: Node<'_>) -> Result<Self, ParseError> {
        node.as_object()?;
        let resource_id = node.field("@id")?.as_str()?.to_string();

        // Data apps publish no resource endpoint.
        let endpoint = match node.get("ids:resourceEndpoint") {
            Some(list) => {
                let first = list.first()?;
                let base = first.wrapped_id("ids:accessURL")?;
                let path = first.field("ids:path")?.as_str()?.to_string();
                let documentation = match first.get("ids:endpointDocumentation") {
                    Some(docs) => docs.first()?.field("@id")?.as_str()?.to_string(),
                    None => String::new(),
                };
                Some(ResourceEndpoint {
                    access_url: format!("{base}{path}"),
                    path,
                    documentation,
                })
            }
            None => None,
        };

        let contract_offer = match node.get("ids:contractOffer") {
            Some(list) => Some(ContractOffer::new(list.first()?.as_object()?.clone())),
            None => None,
        };

        let artifact_id = if contract_offer.is_some() {
            node.field("ids:representation")?
                .first()?
                .field("ids:instance")?
                .first()?
                .field("@id")?
                .as_str()?
                .to_string()
        } else {
            resource_id.clone()
        };

        let created = match node.get("ids:created") {
            Some(created) => Some(created.field("@value")?.as_str()?.to_string()),
            None => None,
        };

        Ok(Self {
            resource_id,
            artifact_id: ArtifactId(artifact_id),
            contract_offer,
            created,
            endpoint,
            title: node.optional_language_value("ids:title")?,
            description: node.optional_language_value("ids:description")?,
        })
    }

    pub fn access_url(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.access_url.as_str())
    }

    pub fn path(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.path.as_str())
    }

    pub fn documentation(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.documentation.as_str())
    }
}

/// Cursor over the raw document that remembers where it is, so every
/// failure can name the exact key path.
#[derive(Clone, Copy)]
struct Node<'a> {
    value: &'a Value,
    path: Path<'a>,
}

#[derive(Clone, Copy)]
enum Path<'a> {
    Root,
    Key(&'a Node<'a>, &'a str),
    Index(&'a Node<'a>, usize),
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Self {
        Node {
            value,
            path: Path::Root,
        }
    }

    fn render_path(&self) -> String {
        match self.path {
            Path::Root => String::new(),
            Path::Key(parent, key) => match parent.path {
                Path::Root => key.to_string(),
                _ => format!("{}.{key}", parent.render_path()),
            },
            Path::Index(parent, index) => format!("{}[{index}]", parent.render_path()),
        }
    }

    fn display_path(&self) -> String {
        match self.path {
            Path::Root => "<document>".to_string(),
            _ => self.render_path(),
        }
    }

    fn key_path(&self, key: &str) -> String {
        match self.path {
            Path::Root => key.to_string(),
            _ => format!("{}.{key}", self.render_path()),
        }
    }

    /// Child under `key`; JSON `null` counts as absent.
    fn get(&'a self, key: &'a str) -> Option<Node<'a>> {
        self.value
            .get(key)
            .filter(|value| !value.is_null())
            .map(|value| Node {
                value,
                path: Path::Key(self, key),
            })
    }

    fn field(&'a self, key: &'a str) -> Result<Node<'a>, ParseError> {
        self.get(key).ok_or_else(|| ParseError::MissingField {
            path: self.key_path(key),
        })
    }

    fn as_array(&self) -> Result<&'a Vec<Value>, ParseError> {
        self.value.as_array().ok_or_else(|| ParseError::UnexpectedShape {
            path: self.display_path(),
            expected: "array",
        })
    }

    fn as_object(&self) -> Result<&'a Map<String, Value>, ParseError> {
        self.value.as_object().ok_or_else(|| ParseError::UnexpectedShape {
            path: self.display_path(),
            expected: "object",
        })
    }

    fn as_str(&self) -> Result<&'a str, ParseError> {
        self.value.as_str().ok_or_else(|| ParseError::UnexpectedShape {
            path: self.display_path(),
            expected: "string",
        })
    }

    fn index(&'a self, index: usize) -> Result<Node<'a>, ParseError> {
        let items = self.as_array()?;
        let value = items.get(index).ok_or_else(|| ParseError::IndexOutOfRange {
            path: self.display_path(),
            index,
        })?;
        Ok(Node {
            value,
            path: Path::Index(self, index),
        })
    }

    fn first(&'a self) -> Result<Node<'a>, ParseError> {
        self.index(0)
    }

    fn items(&'a self) -> Result<Vec<Node<'a>>, ParseError> {
        let len = self.as_array()?.len();
        (0..len).map(|index| self.index(index)).collect()
    }

    /// `{"@id": ...}` wrapper under `key`.
    fn wrapped_id(&'a self, key: &'a str) -> Result<String, ParseError> {
        let node = self.field(key)?;
        Ok(node.field("@id")?.as_str()?.to_string())
    }

    /// First entry of a language-tagged list under `key`.
    fn language_value(&'a self, key: &'a str) -> Result<String, ParseError> {
        let list = self.field(key)?;
        let first = list.first()?;
        Ok(first.field("@value")?.as_str()?.to_string())
    }

    /// Like [`Node::language_value`], but an absent key or empty list is `None`.
    fn optional_language_value(&'a self, key: &'a str) -> Result<Option<String>, ParseError> {
        let Some(list) = self.get(key) else {
            return Ok(None);
        };
        if list.as_array()?.is_empty() {
            return Ok(None);
        }
        let first = list.first()?;
        Ok(Some(first.field("@value")?.as_str()?.to_string()))
    }
}
