//! The persistent catalog of installed packages.
//!
//! Records are owned exclusively by the registry: registering, overwriting,
//! and unregistering a package all go through [`RegistryStore`], which also
//! owns the record's install directory lifecycle.

mod store;
mod types;

pub use store::RegistryStore;
pub use types::{InstalledPackageRecord, REGISTRY_VERSION, RegistryDocument, SourceRef};

#[cfg(test)]
mod tests;
