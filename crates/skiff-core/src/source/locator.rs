//! Package source locator types.

use serde::{Deserialize, Serialize};
use url::Url;

/// A parsed package source location: a git repository plus an optional
/// subdirectory inside it that holds the package root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocator {
    /// Repository URL (e.g., "https://github.com/org/repo.git")
    pub repo_url: String,
    /// Subdirectory within the repository, if the package is not at the root
    pub subdir: Option<String>,
}

impl SourceLocator {
    /// Create a locator pointing at a repository root.
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            subdir: None,
        }
    }

    /// Set the subdirectory path.
    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    /// Parse a locator of the form `<repo-url>[/<subdirectory>]`.
    ///
    /// Supported forms:
    /// - `https://github.com/org/repo`
    /// - `https://github.com/org/repo/pkgs/echo` (subdir after org/repo)
    /// - `https://host/org/repo.git/pkgs/echo` (`.git` marks the repo end)
    /// - `git@github.com:org/repo.git/pkgs/echo` (scp-style remote)
    ///
    /// For web URLs without a `.git` marker the first two path segments are
    /// taken as the repository; deeper nesting (e.g. gitlab subgroups) needs
    /// the explicit `.git` suffix to disambiguate.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let raw = raw.trim().trim_end_matches('/');
        if raw.is_empty() {
            return Err(crate::SkiffError::Fetch(
                "empty source locator".to_string(),
            ));
        }

        // `.git/` splits repo from subdir in any form.
        if let Some(idx) = raw.find(".git/") {
            let (repo, rest) = raw.split_at(idx + ".git".len());
            let subdir = rest.trim_start_matches('/');
            let mut locator = Self::new(repo);
            if !subdir.is_empty() {
                locator = locator.with_subdir(subdir);
            }
            return Ok(locator);
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Self::split_web_url(raw);
        }

        // scp-style remote: `git@host:path`. Everything after the first two
        // path segments is the subdirectory.
        if !raw.contains("://")
            && let Some((host_part, path)) = raw.split_once(':')
            && host_part.contains('@')
        {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            if segments.len() > 2 {
                return Ok(Self::new(format!(
                    "{}:{}",
                    host_part,
                    segments[..2].join("/")
                ))
                .with_subdir(segments[2..].join("/")));
            }
            return Ok(Self::new(raw));
        }

        Ok(Self::new(raw))
    }

    /// Stable directory-name stem for staging this repository.
    pub fn staging_stem(&self) -> String {
        let hash = blake3::hash(self.repo_url.as_bytes()).to_hex().to_string();
        hash[..16].to_string()
    }

    fn split_web_url(raw: &str) -> crate::Result<Self> {
        let parsed = Url::parse(raw)
            .map_err(|e| crate::SkiffError::Fetch(format!("invalid source URL '{raw}': {e}")))?;
        let segments: Vec<String> = parsed
            .path_segments()
            .map(|s| {
                s.filter(|seg| !seg.is_empty())
                    .map(|seg| seg.to_string())
                    .collect()
            })
            .unwrap_or_default();
        if segments.len() <= 2 {
            return Ok(Self::new(raw));
        }

        let mut repo = parsed.clone();
        repo.set_path(&segments[..2].join("/"));
        Ok(Self::new(repo.as_str().trim_end_matches('/')).with_subdir(segments[2..].join("/")))
    }
}

impl std::fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subdir {
            Some(subdir) => write!(f, "{}/{}", self.repo_url, subdir),
            None => write!(f, "{}", self.repo_url),
        }
    }
}
