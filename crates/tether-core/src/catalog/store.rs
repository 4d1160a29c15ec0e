//! Directory-backed catalog store.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::service::McpServiceConfig;

use super::{ServiceCatalog, parser};

#[derive(Debug, Clone)]
pub struct CatalogStore {
    dir: PathBuf,
}

impl CatalogStore {
    /// Store under `<config dir>/tether/services`
    pub fn from_default_dir() -> anyhow::Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("tether")
            .join("services");
        Ok(Self::from_dir(dir))
    }

    pub fn from_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn service_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Load every `.json`/`.toml` file in the directory.
    ///
    /// A missing directory yields an empty catalog. Files are read in name
    /// order; a service id seen twice fails the load.
    pub fn load(&self) -> anyhow::Result<ServiceCatalog> {
        let mut catalog = ServiceCatalog::new();
        for (path, configs) in self.read_files()? {
            for config in configs {
                catalog
                    .insert(config)
                    .with_context(|| format!("Invalid catalog entry in {}", path.display()))?;
            }
        }

        debug!(dir = %self.dir.display(), services = catalog.len(), "loaded service catalog");
        Ok(catalog)
    }

    /// File that currently defines `id`, if any
    pub fn origin(&self, id: &str) -> anyhow::Result<Option<PathBuf>> {
        Ok(self
            .read_files()?
            .into_iter()
            .find(|(_, configs)| configs.iter().any(|c| c.id == id))
            .map(|(path, _)| path))
    }

    /// Write a service as `<id>.json`, returning the file path.
    ///
    /// A service defined in any other file (a bundle or a TOML file) is not
    /// written; that file has to be edited instead.
    pub fn save(&self, config: &McpServiceConfig) -> anyhow::Result<PathBuf> {
        validate_file_id(&config.id)?;

        let path = self.service_path(&config.id);
        match self.origin(&config.id)? {
            Some(origin) if origin != path => anyhow::bail!(
                "Service '{}' is defined in {}; edit that file instead",
                config.id,
                origin.display()
            ),
            None if path.exists() => anyhow::bail!(
                "{} already holds a different service",
                path.display()
            ),
            _ => {}
        }

        let content = parser::to_json(config)?;
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create catalog directory: {}", self.dir.display())
        })?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write service file: {}", path.display()))?;
        Ok(path)
    }

    /// Delete the file defining `id`; returns whether a service was removed.
    ///
    /// Files holding several services are left untouched and reported as an
    /// error.
    pub fn remove(&self, id: &str) -> anyhow::Result<bool> {
        validate_file_id(id)?;

        let Some((path, configs)) = self
            .read_files()?
            .into_iter()
            .find(|(_, configs)| configs.iter().any(|c| c.id == id))
        else {
            return Ok(false);
        };

        if configs.len() > 1 {
            anyhow::bail!(
                "Service '{}' shares {} with {} other service(s); edit that file instead",
                id,
                path.display(),
                configs.len() - 1
            );
        }

        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove service file: {}", path.display()))?;
        Ok(true)
    }

    /// Parse every descriptor file, in name order
    fn read_files(&self) -> anyhow::Result<Vec<(PathBuf, Vec<McpServiceConfig>)>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).with_context(|| {
            format!("Failed to read catalog directory: {}", self.dir.display())
        })? {
            let path = entry?.path();
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "json" || e == "toml");
            if path.is_file() && supported {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "skipping non-descriptor entry");
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| parser::parse_service_file(&path).map(|configs| (path, configs)))
            .collect()
    }
}

/// Service ids become file names
fn validate_file_id(id: &str) -> anyhow::Result<()> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        anyhow::bail!("Service id '{}' cannot be used as a file name", id);
    }
    Ok(())
}
