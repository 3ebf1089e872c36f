//! Fetching package sources from git remotes.
//!
//! A source is located by `<repo-url>[/<subdirectory>]`; fetching clones the
//! repository into a fresh staging directory and resolves the package root
//! inside it.

mod fetcher;
mod locator;

pub use fetcher::{FetchedSource, SourceFetcher};
pub use locator::SourceLocator;
