//! Argument schema compilation.
//!
//! Turns a package's declared argument table into a parser over the raw
//! token vector the CLI hands through after `skiff run <name>`. Violations
//! are collected into one `ArgumentError` listing every problem, never
//! reported one at a time.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{Result, SkiffError};
use crate::manifest::{ArgKind, ArgumentSpec};

/// Compiled parser for one package's argument table.
#[derive(Debug, Clone)]
pub struct ArgumentParser {
    specs: Vec<ArgumentSpec>,
}

impl ArgumentParser {
    /// Compile a parser from a declared argument table.
    pub fn new(specs: &[ArgumentSpec]) -> Self {
        Self {
            specs: specs.to_vec(),
        }
    }

    /// Whether the raw tokens ask for the package help view.
    pub fn wants_help(tokens: &[String]) -> bool {
        tokens.iter().any(|t| t == "--help" || t == "-h")
    }

    /// Parse and coerce raw tokens into keyword arguments.
    ///
    /// Flag names map to keyword keys with hyphens folded to underscores.
    /// Booleans are presence flags; lists accumulate repeated and
    /// space-separated values; absent arguments fall back to their declared
    /// default or are omitted entirely when they have none.
    pub fn parse(&self, tokens: &[String]) -> Result<Map<String, Value>> {
        let mut problems = Vec::new();
        let mut values = Map::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            index += 1;

            let Some((spec, inline)) = self.match_flag(token) else {
                if token.starts_with('-') && token.len() > 1 {
                    problems.push(format!("unknown argument: {token}"));
                } else {
                    problems.push(format!("unexpected positional argument: '{token}'"));
                }
                continue;
            };
            let key = kwarg_key(&spec.name);
            let duplicate = !seen.insert(spec.name.clone()) && spec.kind != ArgKind::List;
            if duplicate {
                problems.push(format!("duplicate argument: --{}", spec.name));
            }

            match spec.kind {
                ArgKind::Boolean => {
                    if inline.is_some() {
                        problems.push(format!(
                            "boolean flag --{} does not take a value",
                            spec.name
                        ));
                    } else if !duplicate {
                        values.insert(key, Value::Bool(true));
                    }
                }
                ArgKind::List => {
                    let mut items: Vec<Value> = Vec::new();
                    if let Some(inline) = inline {
                        items.push(Value::String(inline.to_string()));
                    }
                    while index < tokens.len() && !is_flag_like(&tokens[index]) {
                        items.push(Value::String(tokens[index].clone()));
                        index += 1;
                    }
                    let entry = values.entry(key).or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(list) = entry {
                        list.extend(items);
                    }
                }
                _ => {
                    let raw = if let Some(inline) = inline {
                        Some(inline.to_string())
                    } else if index < tokens.len() {
                        let next = tokens[index].clone();
                        index += 1;
                        Some(next)
                    } else {
                        problems.push(format!("missing value for --{}", spec.name));
                        None
                    };
                    if let Some(raw) = raw {
                        match coerce_scalar(spec, &raw) {
                            Ok(value) => {
                                if let Some(choices) = &spec.choices
                                    && !choices.iter().any(|c| choice_matches(spec.kind, c, &value))
                                {
                                    problems.push(format!(
                                        "invalid choice for --{}: '{}' (choose from: {})",
                                        spec.name,
                                        raw,
                                        render_choices(choices)
                                    ));
                                } else if !duplicate {
                                    values.insert(key, value);
                                }
                            }
                            Err(problem) => problems.push(problem),
                        }
                    }
                }
            }
        }

        for spec in &self.specs {
            if seen.contains(&spec.name) {
                continue;
            }
            if spec.required && spec.kind != ArgKind::Boolean {
                problems.push(format!("missing required argument: --{}", spec.name));
                continue;
            }
            if let Some(default) = &spec.default {
                values.insert(kwarg_key(&spec.name), default.clone());
            }
        }

        if problems.is_empty() {
            Ok(values)
        } else {
            Err(SkiffError::Argument(problems))
        }
    }

    fn match_flag<'a>(&self, token: &'a str) -> Option<(&ArgumentSpec, Option<&'a str>)> {
        if let Some(rest) = token.strip_prefix("--") {
            let (name, inline) = match rest.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (rest, None),
            };
            return self.specs.iter().find(|s| s.name == name).map(|s| (s, inline));
        }
        if let Some(rest) = token.strip_prefix('-')
            && !rest.is_empty()
        {
            return self
                .specs
                .iter()
                .find(|s| s.short.as_deref() == Some(rest))
                .map(|s| (s, None));
        }
        None
    }
}

/// Keyword key for a declared flag name: hyphens fold to underscores so the
/// key is valid as an identifier on the package side.
pub(crate) fn kwarg_key(name: &str) -> String {
    name.replace('-', "_")
}

/// Human-readable label for a JSON value in messages and help text.
pub(crate) fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_scalar(spec: &ArgumentSpec, raw: &str) -> std::result::Result<Value, String> {
    match spec.kind {
        ArgKind::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("invalid integer for --{}: '{raw}'", spec.name)),
        ArgKind::Float => raw
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| format!("invalid float for --{}: '{raw}'", spec.name)),
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn choice_matches(kind: ArgKind, choice: &Value, value: &Value) -> bool {
    if kind == ArgKind::Float
        && let (Some(a), Some(b)) = (choice.as_f64(), value.as_f64())
    {
        return a == b;
    }
    choice == value
}

fn render_choices(choices: &[Value]) -> String {
    choices
        .iter()
        .map(value_label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_flag_like(token: &str) -> bool {
    token.starts_with('-') && token.len() > 1
}
