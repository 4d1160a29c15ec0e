//! Service catalog
//!
//! An id-keyed collection of service descriptors, loaded from JSON or TOML
//! files. The catalog is where the `id` uniqueness invariant is enforced.

pub mod parser;
pub mod store;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::service::{ConfigWarning, McpServiceConfig, SchemaError, lint};

pub use parser::{parse_service_file, parse_services_json, parse_services_toml, to_json};
pub use store::CatalogStore;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate service id '{0}'")]
    DuplicateId(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Toml(String),
}

/// Services keyed by id, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: BTreeMap<String, McpServiceConfig>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service; an existing service with the same id is an error
    pub fn insert(&mut self, config: McpServiceConfig) -> Result<(), CatalogError> {
        if self.services.contains_key(&config.id) {
            return Err(CatalogError::DuplicateId(config.id));
        }
        self.services.insert(config.id.clone(), config);
        Ok(())
    }

    /// Add or replace a service, returning the previous one
    pub fn upsert(&mut self, config: McpServiceConfig) -> Option<McpServiceConfig> {
        self.services.insert(config.id.clone(), config)
    }

    pub fn get(&self, id: &str) -> Option<&McpServiceConfig> {
        self.services.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<McpServiceConfig> {
        self.services.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &McpServiceConfig> {
        self.services.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Lint every service, tagging warnings with the service id
    pub fn warnings(&self) -> Vec<(&str, ConfigWarning)> {
        self.services
            .iter()
            .flat_map(|(id, config)| lint(config).into_iter().map(move |w| (id.as_str(), w)))
            .collect()
    }
}
