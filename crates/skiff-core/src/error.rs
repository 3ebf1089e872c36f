//! Error types for the package lifecycle and execution path.

use thiserror::Error;

/// Errors raised by package install, registry, and execution operations.
#[derive(Debug, Error)]
pub enum SkiffError {
    /// Cloning or updating the package source failed (network, auth,
    /// missing ref, or missing subdirectory).
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// No recognized configuration file, or the file could not be parsed.
    #[error("package configuration error: {0}")]
    Config(String),

    /// Metadata schema violations, collected across the whole document.
    #[error("invalid package metadata:\n{}", bullet_list(.0))]
    Validation(Vec<String>),

    /// A package with this name is already registered.
    #[error("package '{0}' is already installed (use --force to replace)")]
    Duplicate(String),

    /// No registered package under this name.
    #[error("package '{0}' is not installed")]
    NotFound(String),

    /// CLI argument violations, collected across the whole invocation.
    #[error("invalid arguments:\n{}", bullet_list(.0))]
    Argument(Vec<String>),

    /// The entry point could not be resolved or the runner could not start.
    #[error("execution failed: {0}")]
    Execution(String),

    /// Underlying filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted document could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SkiffError>;

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  - {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
