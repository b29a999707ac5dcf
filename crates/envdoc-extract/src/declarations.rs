//! Environment variable declarations from templated deployment manifests.
//!
//! Helm templates are not valid YAML until rendered, so this is a line scan
//! rather than a structural parse. Handles the shapes the charts use:
//! - `- name: FOO` followed by `value: "{{ .Values.foo }}"` (optionally
//!   with filters such as `| quote`)
//! - composite values: `value: "{{ .Values.host }}.{{ .Values.domain }}"`
//! - `valueFrom:` secret or config map references
//!
//! The env block is entered by a bare `env:` line and left at the next
//! `ports:` line. That boundary depends on container field order.


use crate::patterns::{
    ANY_NAME_ENTRY, COMPOSITE_VALUE, DECLARATION, ENV_HEADER, PORTS_HEADER, RAW_VALUE,
    TEMPLATE_VALUE,
};

/// Lines inspected after `- name:` for the value source.
const LOOKAHEAD: usize = 2;

/// One named env entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// Raw value expression. `None` when the value is sourced externally
    /// (`valueFrom:`) or no value line was recognized.
    pub expression: Option<String>,
}

impl Declaration {
    pub fn new(name: impl Into<String>, expression: Option<&str>) -> Self {
        Self {
            name: name.into(),
            expression: expression.map(str::to_string),
        }
    }
}

/// Extract declarations from a single manifest, in encounter order.
///
/// Duplicate names are kept.
pub fn extract_single(manifest: &str) -> Vec<Declaration> {
    let lines: Vec<&str> = manifest.lines().collect();
    scan(&lines)
}

/// Extract declarations per document of a `---` separated manifest.
///
/// Documents without any declaration are dropped rather than returned as
/// empty lists.
pub fn extract_multi(manifest: &str) -> Vec<Vec<Declaration>> {
    split_documents(manifest)
        .iter()
        .map(|document| scan(document))
        .filter(|declarations| !declarations.is_empty())
        .collect()
}

fn split_documents(manifest: &str) -> Vec<Vec<&str>> {
    let mut documents = vec![Vec::new()];
    for line in manifest.lines() {
        if line.trim_end() == "---" {
            documents.push(Vec::new());
        } else if let Some(current) = documents.last_mut() {
            current.push(line);
        }
    }
    documents
}

fn scan(lines: &[&str]) -> Vec<Declaration> {
    let mut in_env = false;
    let mut declarations = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if ENV_HEADER.is_match(line) {
            in_env = true;
            continue;
        }
        if !in_env {
            continue;
        }
        if let Some(caps) = DECLARATION.captures(line) {
            declarations.push(Declaration {
                name: caps[1].to_string(),
                expression: value_source(&lines[i + 1..]),
            });
        } else if PORTS_HEADER.is_match(line) {
            in_env = false;
        }
    }

    tracing::debug!(count = declarations.len(), "extracted env declarations");
    declarations
}

/// Look at the lines following a `- name:` for the value expression.
///
/// Priority per line: composite expression, single `{{ }}` action,
/// `valueFrom:`. The window closes early at the next `- name:` entry.
fn value_source(following: &[&str]) -> Option<String> {
    for line in following.iter().take(LOOKAHEAD) {
        if ANY_NAME_ENTRY.is_match(line) {
            break;
        }
        if COMPOSITE_VALUE.is_match(line) {
            if let Some(caps) = RAW_VALUE.captures(line) {
                return Some(caps[1].trim().to_string());
            }
        } else if let Some(caps) = TEMPLATE_VALUE.captures(line) {
            return Some(caps[1].to_string());
        } else if line.contains("valueFrom:") {
            return None;
        }
    }
    None
}
