//! Lookups over a parsed self-description.
//!
//! The index borrows the self-description and answers catalog-level questions
//! (which catalog has this id, where are the data apps, which data-app
//! endpoints document a given API version) without copying resources.

use crate::catalog::identity::CatalogId;
use crate::catalog::model::{OfferedResource, ResourceCatalog, SelfDescription};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct CatalogIndex<'a> {
    description: &'a SelfDescription,
    by_id: BTreeMap<&'a CatalogId, &'a ResourceCatalog>,
}

impl<'a> CatalogIndex<'a> {
    /// Index catalogs by id. When a document repeats a catalog id, the first
    /// occurrence wins.
    pub fn new(description: &'a SelfDescription) -> Self {
        let mut by_id = BTreeMap::new();
        for catalog in &description.catalogs {
            by_id.entry(&catalog.id).or_insert(catalog);
        }
        Self { description, by_id }
    }

    pub fn catalog(&self, id: &CatalogId) -> Option<&'a ResourceCatalog> {
        self.by_id.get(id).copied()
    }

    /// Catalog ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &'a CatalogId> + 'a {
        self.description.catalogs.iter().map(|catalog| &catalog.id)
    }

    /// The `<connector id>:data-app` catalog, if the connector publishes one.
    pub fn data_app_catalog(&self) -> Option<&'a ResourceCatalog> {
        self.catalog(&self.description.id.data_app_catalog())
    }

    /// Data apps whose endpoint path ends with `api_version`.
    ///
    /// Data apps that publish no endpoint cannot match and are skipped.
    pub fn data_apps_for_version(&self, api_version: &str) -> Vec<&'a OfferedResource> {
        let Some(catalog) = self.data_app_catalog() else {
            return Vec::new();
        };
        catalog
            .offered_resources
            .iter()
            .filter(|resource| {
                resource
                    .path()
                    .is_some_and(|path| path.ends_with(api_version))
            })
            .collect()
    }

    /// Documentation URLs of the data apps serving `api_version`, in document
    /// order.
    pub fn openapi_documentation(&self, api_version: &str) -> Vec<String> {
        self.data_apps_for_version(api_version)
            .into_iter()
            .filter_map(|resource| resource.documentation())
            .map(str::to_string)
            .collect()
    }
}
