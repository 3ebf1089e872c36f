//! Package metadata: config schema, document discovery, and validation.
//!
//! Parsing is deliberately forgiving (any accepted filename, any missing
//! field) so that validation can report every problem in one pass.

mod loader;
mod schema;

pub use loader::{
    CONFIG_FILENAMES, RESERVED_ARG_NAMES, check_entry_file, find_config_file, load_manifest,
    load_validated, validate_manifest,
};
pub use schema::{ArgKind, ArgumentSpec, EntryPoint, PackageManifest};
