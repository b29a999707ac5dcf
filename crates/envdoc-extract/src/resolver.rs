//! Resolve raw value expressions against the chart defaults.
//!
//! Resolution never fails. A reference that matches nothing resolves to an
//! empty [`Resolution`], which the table renders as a placeholder.


use crate::keydoc::KeyDocStore;
use crate::patterns::{TEMPLATE_ACTION, VALUES_REF};

/// Rendered in place of a composite expression none of whose parts resolved.
pub const PLACEHOLDER: &str = "-";

/// Shape of a value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionKind {
    /// No template action at all.
    Literal,
    /// One `.Values` reference, possibly with filters.
    SingleKeyRef(String),
    /// Several template actions, each referencing `.Values`, joined by
    /// literal text. Paths in left-to-right order.
    CompositeRef(Vec<String>),
    /// Template actions without any `.Values` reference (`include`, `tpl`).
    Unresolvable,
}

/// Description and default value resolved for one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub description: String,
    pub value: Option<String>,
}

/// Classify an expression by the `.Values` references it carries.
///
/// The shape is decided by the head of each action: a lone
/// `{{ .Values.a | default .Values.b }}` is a single reference to `a`.
/// Once two actions reference `.Values`, every reference in the expression
/// is a composite part, filter arguments included.
pub fn classify(expression: &str) -> ExpressionKind {
    let actions: Vec<&str> = TEMPLATE_ACTION
        .captures_iter(expression)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if actions.is_empty() {
        return ExpressionKind::Literal;
    }

    let mut heads: Vec<String> = actions.iter().filter_map(|body| action_reference(body)).collect();
    match heads.len() {
        0 => ExpressionKind::Unresolvable,
        1 => ExpressionKind::SingleKeyRef(heads.remove(0)),
        _ => ExpressionKind::CompositeRef(all_references(expression)),
    }
}

/// Every `.Values` path in `text`, left to right.
fn all_references(text: &str) -> Vec<String> {
    VALUES_REF
        .captures_iter(text)
        .map(|caps| caps[1].trim_end_matches('.').to_string())
        .filter(|path| !path.is_empty())
        .collect()
}

/// The `.Values` path at the head of one action body, filters stripped.
fn action_reference(body: &str) -> Option<String> {
    let head = body.split('|').next().unwrap_or(body);
    let head = head.trim().trim_matches('-').trim();
    VALUES_REF
        .captures(head)
        .map(|caps| caps[1].trim_end_matches('.').to_string())
        .filter(|path| !path.is_empty())
}

/// Resolve one declaration's expression against the store.
///
/// `None` (externally sourced) resolves to an empty description and no
/// value, same as literals and unknown keys.
pub fn resolve(expression: Option<&str>, store: &KeyDocStore) -> Resolution {
    let Some(expression) = expression else {
        return Resolution::default();
    };

    match classify(expression) {
        ExpressionKind::Literal | ExpressionKind::Unresolvable => {
            tracing::debug!(expression, "expression has no values reference");
            Resolution::default()
        }
        ExpressionKind::SingleKeyRef(path) => match store.lookup(&path) {
            Some(entry) => Resolution {
                description: entry.description.clone(),
                value: entry.default.clone(),
            },
            None => {
                tracing::debug!(path = %path, "values key not documented");
                Resolution::default()
            }
        },
        ExpressionKind::CompositeRef(paths) => resolve_composite(&paths, store),
    }
}

fn resolve_composite(paths: &[String], store: &KeyDocStore) -> Resolution {
    let mut descriptions = Vec::new();
    let mut defaults = Vec::new();

    for path in paths {
        let Some(entry) = store.lookup(path) else {
            tracing::debug!(path = %path, "composite part not documented");
            continue;
        };
        if !entry.description.is_empty() {
            descriptions.push(entry.description.as_str());
        }
        if let Some(default) = entry.default.as_deref().filter(|d| !d.is_empty()) {
            defaults.push(default);
        }
    }

    let description = if descriptions.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        descriptions.join(" / ")
    };
    let value = if defaults.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        defaults.join(".")
    };

    Resolution {
        description,
        value: Some(value),
    }
}
