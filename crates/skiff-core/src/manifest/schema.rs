//! Package manifest schema.
//!
//! Defines the structure of the config document every package carries at its
//! root, plus the argument table it declares for `skiff run`. YAML and JSON
//! documents both parse into this one structure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkiffError};

/// Package manifest - the parsed form of a package's config document.
///
/// Every field is individually defaulted so a partial document still parses;
/// missing required fields are the validator's problem, not the parser's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Machine-readable package name (unique registry key)
    #[serde(default)]
    pub name: String,

    /// Package version string
    #[serde(default)]
    pub version: String,

    /// Short human-readable description
    #[serde(default)]
    pub description: String,

    /// Author name or contact
    #[serde(default)]
    pub author: String,

    /// Source repository URL
    #[serde(default, alias = "source_url")]
    pub repository_url: String,

    /// Entry point reference in `module.attribute` form
    #[serde(default)]
    pub entry_point: String,

    /// Declared dependencies (informational only)
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Runtime version constraint (informational)
    #[serde(rename = "python_version", default = "default_runtime_version")]
    pub runtime_version: String,

    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Declared CLI arguments, in declaration order
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

fn default_runtime_version() -> String {
    ">=3.8".to_string()
}

impl Default for PackageManifest {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            description: String::new(),
            author: String::new(),
            repository_url: String::new(),
            entry_point: String::new(),
            dependencies: Vec::new(),
            runtime_version: default_runtime_version(),
            tags: Vec::new(),
            arguments: Vec::new(),
        }
    }
}

impl PackageManifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| SkiffError::Config(format!("malformed YAML config: {e}")))
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| SkiffError::Config(format!("malformed JSON config: {e}")))
    }

    /// Parsed entry point reference.
    pub fn entry(&self) -> Result<EntryPoint> {
        EntryPoint::parse(&self.entry_point)
    }
}

/// One declared CLI argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    /// Long flag name (exposed as `--name`)
    #[serde(default)]
    pub name: String,

    /// Value kind governing coercion
    #[serde(rename = "type", default)]
    pub kind: ArgKind,

    /// Help text shown in the package help view
    #[serde(default)]
    pub help: String,

    /// Optional single-character short alias (exposed as `-s`)
    #[serde(default)]
    pub short: Option<String>,

    /// Whether the argument must be supplied
    #[serde(default)]
    pub required: bool,

    /// Default value used when the flag is absent
    #[serde(default)]
    pub default: Option<serde_json::Value>,

    /// Closed set of admissible values
    #[serde(default)]
    pub choices: Option<Vec<serde_json::Value>>,
}

/// Argument value kinds accepted by the schema compiler.
///
/// Config documents use the short tokens (`str`, `int`, ...); the long forms
/// are accepted as aliases. An unrecognized token parses as `Unknown` and is
/// rejected during validation instead of failing the whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgKind {
    /// Passthrough text value
    #[default]
    #[serde(rename = "str", alias = "string")]
    String,
    /// Integer value
    #[serde(rename = "int", alias = "integer")]
    Integer,
    /// Floating-point value
    #[serde(rename = "float", alias = "number")]
    Float,
    /// Presence flag: absent uses the declared default, present means true
    #[serde(rename = "bool", alias = "boolean")]
    Boolean,
    /// Accumulating list of strings
    #[serde(rename = "list")]
    List,
    /// Unrecognized kind token, rejected at validation time
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArgKind::String => "string",
            ArgKind::Integer => "integer",
            ArgKind::Float => "float",
            ArgKind::Boolean => "boolean",
            ArgKind::List => "list",
            ArgKind::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Parsed `module.attribute` entry point reference.
///
/// Resolution of a string-named entry point is a validated capability lookup:
/// the reference must match a strict pattern before anything is resolved
/// against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Module reference, resolved to a file against the loader search path
    pub module: String,
    /// Attribute looked up inside the module
    pub attribute: String,
}

impl EntryPoint {
    /// Parse a `module.attribute` reference.
    ///
    /// Exactly one separating dot with an identifier on each side.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split('.');
        if let (Some(module), Some(attribute), None) = (parts.next(), parts.next(), parts.next())
            && is_identifier(module)
            && is_identifier(attribute)
        {
            return Ok(Self {
                module: module.to_string(),
                attribute: attribute.to_string(),
            });
        }
        Err(SkiffError::Config(format!(
            "entry_point '{raw}' must name 'module.attribute' with identifier segments"
        )))
    }

    /// Module file names this reference can resolve to, in probe order.
    pub fn file_candidates(&self) -> [String; 2] {
        [format!("{}.py", self.module), format!("{}.sh", self.module)]
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.attribute)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
