//! Package help view rendering.
//!
//! `skiff run <name> --help` surfaces this view instead of executing: one
//! line per declared argument with its alias, kind, and constraints.

use crate::args::compiler::value_label;
use crate::manifest::{ArgKind, ArgumentSpec, PackageManifest};

/// Render the help view for a package's declared arguments.
pub fn render_help(manifest: &PackageManifest) -> String {
    let mut out = format!("Usage: skiff run {} [arguments]\n", manifest.name);
    if !manifest.description.is_empty() {
        out.push('\n');
        out.push_str(&manifest.description);
        out.push('\n');
    }
    if manifest.arguments.is_empty() {
        out.push_str("\nThis package declares no arguments.\n");
        return out;
    }
    out.push_str("\nArguments:\n");
    for spec in &manifest.arguments {
        out.push_str(&render_argument(spec));
        out.push('\n');
    }
    out
}

fn render_argument(spec: &ArgumentSpec) -> String {
    let mut flag = format!("--{}", spec.name);
    if let Some(short) = &spec.short {
        flag.push_str(&format!(", -{short}"));
    }
    if spec.kind != ArgKind::Boolean {
        flag.push_str(&format!(" <{}>", spec.kind));
    }

    let mut notes = Vec::new();
    if spec.required {
        notes.push("required".to_string());
    }
    if let Some(choices) = &spec.choices {
        let rendered: Vec<String> = choices.iter().map(value_label).collect();
        notes.push(format!("choices: {}", rendered.join(", ")));
    }
    if let Some(default) = &spec.default {
        notes.push(format!("default: {}", value_label(default)));
    }

    let mut line = format!("  {:<30} {}", flag, spec.help);
    if !notes.is_empty() {
        line.push_str(&format!(" [{}]", notes.join(", ")));
    }
    line.trim_end().to_string()
}
