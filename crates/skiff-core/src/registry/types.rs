//! Registry data types.
//!
//! The registry is one JSON document mapping package names to installed
//! records. Each record spreads its manifest snapshot at the top level, so
//! external readers see the package's own fields next to the install
//! bookkeeping.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkiffError};
use crate::manifest::PackageManifest;

/// Current registry document format version.
pub const REGISTRY_VERSION: u32 = 1;

/// Where a package was installed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Repository URL the package was cloned from
    pub url: String,

    /// Branch requested at install time, when not the remote default
    #[serde(default)]
    pub branch: Option<String>,

    /// Subdirectory treated as the package root, when not the repo root
    #[serde(default)]
    pub subdir: Option<String>,
}

impl SourceRef {
    /// Create a source reference for a repository URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: None,
            subdir: None,
        }
    }

    /// Set the branch requested at install time.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Set the subdirectory treated as the package root.
    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }
}

/// One installed package, as recorded in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledPackageRecord {
    /// Metadata snapshot taken at install time
    #[serde(flatten)]
    pub manifest: PackageManifest,

    /// Install directory owned by this record
    #[serde(rename = "installed_path")]
    pub install_dir: PathBuf,

    /// Source reference used at install time and reused by update
    pub source: SourceRef,

    /// Commit SHA checked out at install time
    #[serde(rename = "commit_hash", default)]
    pub commit: Option<String>,

    /// Install timestamp
    #[serde(rename = "install_time")]
    pub installed_at: DateTime<Utc>,
}

impl InstalledPackageRecord {
    /// Create a record for a fresh install, timestamped now.
    pub fn new(manifest: PackageManifest, install_dir: PathBuf, source: SourceRef) -> Self {
        Self {
            manifest,
            install_dir,
            source,
            commit: None,
            installed_at: Utc::now(),
        }
    }

    /// Set the commit SHA captured at fetch time.
    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    /// Package name (the registry key).
    pub fn name(&self) -> &str {
        &self.manifest.name
    }
}

/// The persisted catalog of installed packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Document format version
    pub version: u32,

    /// Installed packages keyed by name
    #[serde(default)]
    pub packages: BTreeMap<String, InstalledPackageRecord>,
}

impl RegistryDocument {
    /// Create an empty document at the current format version.
    pub fn new() -> Self {
        Self {
            version: REGISTRY_VERSION,
            packages: BTreeMap::new(),
        }
    }

    /// Check the document declares a format version this build understands.
    pub fn validate(&self) -> Result<()> {
        if self.version != REGISTRY_VERSION {
            return Err(SkiffError::Config(format!(
                "unsupported registry version {} (expected {})",
                self.version, REGISTRY_VERSION
            )));
        }
        Ok(())
    }
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self::new()
    }
}
