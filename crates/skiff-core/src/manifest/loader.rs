//! Config document discovery, parsing, and validation.
//!
//! A package declares itself through one config file at its root. Accepted
//! filenames are checked in a fixed order; the first match wins and its
//! format adapter produces the common [`PackageManifest`]. Schema violations
//! are collected and reported together rather than one at a time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SkiffError};
use crate::manifest::schema::{ArgKind, PackageManifest};

/// Accepted config filenames, in probe order.
pub const CONFIG_FILENAMES: [&str; 5] = [
    "package.yaml",
    "package.yml",
    "package.json",
    "vagents.yaml",
    "vagents.yml",
];

/// Argument names the runner reserves for itself.
///
/// `help` surfaces the package help view; `input` and `stdin` are the
/// injected aliases for piped content.
pub const RESERVED_ARG_NAMES: [&str; 3] = ["help", "input", "stdin"];

/// Locate the config document under a package root.
pub fn find_config_file(package_root: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| package_root.join(name))
        .find(|path| path.is_file())
}

/// Load and parse the config document under a package root.
///
/// Absence of every accepted filename and parse failures both surface as
/// `ConfigError`; schema problems are left to [`validate_manifest`].
pub fn load_manifest(package_root: &Path) -> Result<PackageManifest> {
    let Some(path) = find_config_file(package_root) else {
        return Err(SkiffError::Config(format!(
            "no config file in {} (expected one of: {})",
            package_root.display(),
            CONFIG_FILENAMES.join(", ")
        )));
    };
    debug!(path = %path.display(), "parsing package config");
    let text = std::fs::read_to_string(&path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        PackageManifest::from_json(&text)
    } else {
        PackageManifest::from_yaml(&text)
    }
}

/// Validate a parsed manifest against the schema rules.
///
/// Every violation is collected; the caller gets all of them in one
/// `ValidationError` instead of the first one found.
pub fn validate_manifest(manifest: &PackageManifest) -> Result<()> {
    let mut problems = Vec::new();

    for (field, value) in [
        ("name", &manifest.name),
        ("version", &manifest.version),
        ("description", &manifest.description),
        ("author", &manifest.author),
        ("repository_url", &manifest.repository_url),
        ("entry_point", &manifest.entry_point),
    ] {
        if value.trim().is_empty() {
            problems.push(format!("missing required field: {field}"));
        }
    }

    if !manifest.entry_point.trim().is_empty() && manifest.entry().is_err() {
        problems.push(format!(
            "entry_point '{}' must name 'module.attribute' with identifier segments",
            manifest.entry_point
        ));
    }

    let mut seen_names = HashSet::new();
    let mut seen_shorts = HashSet::new();
    for spec in &manifest.arguments {
        let label = if spec.name.is_empty() {
            "<unnamed>"
        } else {
            spec.name.as_str()
        };
        if spec.name.trim().is_empty() {
            problems.push("argument with no name".to_string());
        } else if RESERVED_ARG_NAMES.contains(&spec.name.as_str()) {
            problems.push(format!("argument name '{}' is reserved", spec.name));
        } else if !seen_names.insert(spec.name.clone()) {
            problems.push(format!("duplicate argument name '{}'", spec.name));
        }
        if spec.kind == ArgKind::Unknown {
            problems.push(format!("argument '{label}' has an unrecognized kind"));
        }
        if let Some(short) = &spec.short {
            if short.chars().count() != 1 {
                problems.push(format!(
                    "argument '{label}' short alias '{short}' must be a single character"
                ));
            } else if !seen_shorts.insert(short.clone()) {
                problems.push(format!(
                    "argument '{label}' short alias '-{short}' is already taken"
                ));
            }
        }
        if let Some(choices) = &spec.choices {
            if choices.is_empty() {
                problems.push(format!("argument '{label}' declares an empty choices set"));
            } else if let Some(default) = &spec.default
                && !choices.contains(default)
            {
                problems.push(format!(
                    "argument '{label}' default {default} is not one of its choices"
                ));
            }
        }
        if let Some(default) = &spec.default
            && !default_matches_kind(default, spec.kind)
        {
            problems.push(format!(
                "argument '{label}' default {default} does not match kind {}",
                spec.kind
            ));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SkiffError::Validation(problems))
    }
}

/// Confirm the entry module file physically exists under the package root.
pub fn check_entry_file(manifest: &PackageManifest, package_root: &Path) -> Result<()> {
    let entry = manifest.entry()?;
    let found = entry
        .file_candidates()
        .iter()
        .any(|name| package_root.join(name).is_file());
    if found {
        Ok(())
    } else {
        Err(SkiffError::Validation(vec![format!(
            "entry module file '{}.py' (or '{}.sh') not found in package root",
            entry.module, entry.module
        )]))
    }
}

/// Full validation pipeline for a staged package: parse the config, validate
/// the schema, confirm the entry module file.
pub fn load_validated(package_root: &Path) -> Result<PackageManifest> {
    let manifest = load_manifest(package_root)?;
    validate_manifest(&manifest)?;
    check_entry_file(&manifest, package_root)?;
    Ok(manifest)
}

fn default_matches_kind(value: &serde_json::Value, kind: ArgKind) -> bool {
    use serde_json::Value;
    match kind {
        ArgKind::String => value.is_string(),
        ArgKind::Integer => value.is_i64() || value.is_u64(),
        ArgKind::Float => value.is_number(),
        ArgKind::Boolean => value.is_boolean(),
        ArgKind::List => matches!(value, Value::Array(items) if items.iter().all(Value::is_string)),
        ArgKind::Unknown => true,
    }
}
