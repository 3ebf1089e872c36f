//! Argument schema compilation and package help rendering.

mod compiler;
mod help;

pub use compiler::ArgumentParser;
pub use help::render_help;
