//! Init command implementation.
//!
//! Scaffolds a starter package: a config document plus an entry module
//! template that passes validation as written.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use crate::manifest::{EntryPoint, find_config_file};

/// Options for the init command
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Name of the package to scaffold
    pub name: String,
    /// Target directory; defaults to `./<name>`
    pub dir: Option<PathBuf>,
}

impl InitOptions {
    /// Create options for a package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: None,
        }
    }

    /// Set the target directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

/// Report from an init operation
#[derive(Debug, Clone)]
pub struct InitReport {
    /// Directory holding the scaffolded package
    pub package_dir: PathBuf,
    /// Path of the generated config document
    pub config_path: PathBuf,
    /// Path of the generated entry module
    pub module_path: PathBuf,
}

/// Init command orchestrator
#[derive(Debug, Default)]
pub struct InitCommand;

impl InitCommand {
    /// Create a new init command.
    pub fn new() -> Self {
        Self
    }

    /// Execute the init command.
    pub fn execute(&self, options: &InitOptions) -> anyhow::Result<InitReport> {
        let name = options.name.trim();
        if name.is_empty() {
            anyhow::bail!("package name must not be empty");
        }
        let module = name.replace('-', "_");
        let entry = format!("{module}.main");
        if EntryPoint::parse(&entry).is_err() {
            anyhow::bail!("package name '{name}' cannot form a module name");
        }

        let package_dir = options
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(name));
        std::fs::create_dir_all(&package_dir)
            .with_context(|| format!("failed to create {}", package_dir.display()))?;
        if let Some(existing) = find_config_file(&package_dir) {
            anyhow::bail!(
                "refusing to overwrite existing config {}",
                existing.display()
            );
        }

        let config_path = package_dir.join("package.yaml");
        let module_path = package_dir.join(format!("{module}.py"));
        std::fs::write(&config_path, render_config(name, &entry))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        std::fs::write(&module_path, render_module(name))
            .with_context(|| format!("failed to write {}", module_path.display()))?;

        info!(name = %name, dir = %package_dir.display(), "scaffolded starter package");
        Ok(InitReport {
            package_dir,
            config_path,
            module_path,
        })
    }
}

fn render_config(name: &str, entry: &str) -> String {
    format!(
        r#"name: {name}
version: 0.1.0
description: Describe what {name} does
author: Your Name <you@example.com>
repository_url: https://github.com/you/{name}
entry_point: {entry}
tags: []
arguments:
  - name: shout
    type: bool
    help: Uppercase the output
    default: false
"#
    )
}

fn render_module(name: &str) -> String {
    format!(
        r#"def main(shout=False, input=None, **kwargs):
    """Entry point for {name}. Piped stdin arrives as 'input'."""
    text = input or 'hello from {name}'
    if shout:
        return text.upper()
    return text
"#
    )
}
