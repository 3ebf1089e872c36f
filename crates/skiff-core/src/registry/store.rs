//! Registry persistence.
//!
//! One JSON document holds the whole catalog. Every mutation is a
//! read-modify-write with atomic whole-document replacement (write to a temp
//! file, rename over the target), so two racing commands can never leave a
//! half-written document behind; the last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SkiffError};
use crate::registry::types::{InstalledPackageRecord, RegistryDocument};

/// Store for the registry document at a fixed path.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Create a store for the document at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the persisted document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, treating an absent file as an empty registry.
    pub fn load(&self) -> Result<RegistryDocument> {
        if !self.path.exists() {
            return Ok(RegistryDocument::new());
        }
        let bytes = fs::read(&self.path)?;
        let document: RegistryDocument = serde_json::from_slice(&bytes)?;
        document.validate()?;
        Ok(document)
    }

    /// Persist the document atomically.
    pub fn save(&self, document: &RegistryDocument) -> Result<()> {
        let dir = self.path.parent().ok_or_else(|| {
            SkiffError::Config(format!(
                "registry path {} has no parent directory",
                self.path.display()
            ))
        })?;
        fs::create_dir_all(dir)?;

        // Serialize first to catch encoding errors before touching the file
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp_path = dir.join(format!("registry.json.{}.tmp", std::process::id()));
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Register a package record.
    ///
    /// Fails with `DuplicateError` unless `force`, which purges the prior
    /// record (and its directory, when the new install lives elsewhere)
    /// before inserting.
    pub fn register(&self, record: InstalledPackageRecord, force: bool) -> Result<()> {
        let mut document = self.load()?;
        let name = record.name().to_string();
        if let Some(existing) = document.packages.get(&name) {
            if !force {
                return Err(SkiffError::Duplicate(name));
            }
            if existing.install_dir != record.install_dir && existing.install_dir.exists() {
                fs::remove_dir_all(&existing.install_dir)?;
            }
        }
        document.packages.insert(name.clone(), record);
        self.save(&document)?;
        info!(package = %name, "registered package");
        Ok(())
    }

    /// Remove a package record and its owned directory.
    pub fn unregister(&self, name: &str) -> Result<InstalledPackageRecord> {
        let mut document = self.load()?;
        let Some(record) = document.packages.remove(name) else {
            return Err(SkiffError::NotFound(name.to_string()));
        };
        if record.install_dir.exists() {
            fs::remove_dir_all(&record.install_dir)?;
        }
        self.save(&document)?;
        info!(package = %name, "unregistered package");
        Ok(record)
    }

    /// Look up one record by name.
    pub fn get(&self, name: &str) -> Result<InstalledPackageRecord> {
        let document = self.load()?;
        document
            .packages
            .get(name)
            .cloned()
            .ok_or_else(|| SkiffError::NotFound(name.to_string()))
    }

    /// Whether a record exists for `name`.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.packages.contains_key(name))
    }

    /// All records, ordered by name.
    pub fn list(&self) -> Result<Vec<InstalledPackageRecord>> {
        Ok(self.load()?.packages.into_values().collect())
    }

    /// Replace the record for an already-installed package.
    pub fn overwrite(&self, record: InstalledPackageRecord) -> Result<()> {
        let mut document = self.load()?;
        let name = record.name().to_string();
        if !document.packages.contains_key(&name) {
            return Err(SkiffError::NotFound(name));
        }
        document.packages.insert(name, record);
        self.save(&document)
    }

    /// Search records by query and tag filter.
    ///
    /// The query matches case-insensitively as a substring of the name or
    /// description. The tag filter matches records sharing at least one tag
    /// with the requested set. Both filters apply when both are given.
    pub fn search(
        &self,
        query: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<InstalledPackageRecord>> {
        let document = self.load()?;
        let query = query.map(str::to_lowercase);
        Ok(document
            .packages
            .into_values()
            .filter(|record| {
                let query_ok = query.as_deref().is_none_or(|q| {
                    record.manifest.name.to_lowercase().contains(q)
                        || record.manifest.description.to_lowercase().contains(q)
                });
                let tags_ok =
                    tags.is_empty() || record.manifest.tags.iter().any(|t| tags.contains(t));
                query_ok && tags_ok
            })
            .collect())
    }

    /// Records whose install directory has gone missing.
    ///
    /// An absent directory marks an orphaned record needing repair, not a
    /// state to tolerate silently; `status` surfaces these.
    pub fn orphans(&self) -> Result<Vec<InstalledPackageRecord>> {
        let document = self.load()?;
        Ok(document
            .packages
            .into_values()
            .filter(|record| !record.install_dir.is_dir())
            .collect())
    }
}
