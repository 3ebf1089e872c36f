//! Skiff Core Library
//!
//! Provides the domain logic for installing, registering, and executing
//! versioned git-hosted packages: source fetching, metadata validation,
//! the package registry, argument schema compilation, and the sandboxed
//! execution context.

pub mod args;
pub mod commands;
pub mod context;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod sandbox;
pub mod source;

pub use context::AppContext;
pub use error::{Result, SkiffError};

/// Re-exports of commonly used types
pub mod prelude {
    // Context and errors
    pub use crate::context::AppContext;
    pub use crate::error::{Result, SkiffError};

    // Manifest
    pub use crate::manifest::{ArgKind, ArgumentSpec, EntryPoint, PackageManifest};

    // Registry
    pub use crate::registry::{InstalledPackageRecord, RegistryStore, SourceRef};

    // Source
    pub use crate::source::{FetchedSource, SourceFetcher, SourceLocator};

    // Arguments
    pub use crate::args::{ArgumentParser, render_help};

    // Sandbox
    pub use crate::sandbox::{ExecutionRequest, ExecutionResult, FailureDetail};

    // Commands
    pub use crate::commands::{
        InitCommand, InitOptions, InstallCommand, InstallOptions, QueryCommand, RunCommand,
        RunOptions, RunOutcome, StatusReport, UninstallCommand, UninstallOptions, UpdateCommand,
        UpdateOptions,
    };
}
