//! High-level commands for package lifecycle and execution.
//!
//! These are the operations behind the CLI surface. Each command owns an
//! [`AppContext`](crate::context::AppContext), takes a typed options
//! struct, and returns a report for frontends to render.

pub mod init;
pub mod install;
pub mod query;
pub mod run;
pub mod uninstall;
pub mod update;

pub use init::{InitCommand, InitOptions, InitReport};
pub use install::{InstallCommand, InstallOptions, InstallReport};
pub use query::{QueryCommand, StatusReport};
pub use run::{RunCommand, RunOptions, RunOutcome};
pub use uninstall::{UninstallCommand, UninstallOptions, UninstallReport};
pub use update::{UpdateCommand, UpdateOptions, UpdateReport};
