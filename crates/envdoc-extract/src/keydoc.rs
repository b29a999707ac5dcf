//! Chart defaults: dotted key path -> (description, default value).
//!
//! Built from two decoupled passes over the same `values.yaml` text:
//! 1. A structural load with `serde_yaml`, which decides whether a key holds
//!    a mapping, a list or a scalar.
//! 2. A line pass that recovers what the structural load throws away: the
//!    comment block above each key and the raw source text of its value.
//!
//! The line pass yields a side-table of [`LineAnnotation`]s keyed by dotted
//! path. [`KeyDocStore::build`] joins the two. Raw text wins for scalars the
//! loader would coerce, so `enabled: true` stays `"true"` and `version: 1.10`
//! stays `"1.10"`.

use std::collections::HashMap;

use serde_yaml::Value;

use crate::patterns::KEY_LINE;

/// Errors raised while building a [`KeyDocStore`]
#[derive(Debug, thiserror::Error)]
pub enum KeyDocError {
    #[error("Failed to load defaults document: {0}")]
    Load(#[from] serde_yaml::Error),
}

/// What the structural load found at a key's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// String, number or boolean.
    Scalar,
    /// Explicit or implicit null (`key:` with nothing after it).
    Null,
    /// Nested mapping. Never rendered with a literal default.
    Container,
    /// Sequence value.
    List,
    /// Path not reachable in the structural load.
    Unresolved,
}

/// One documented key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDocEntry {
    /// Contiguous comment lines above the key, joined by single spaces.
    pub description: String,
    /// Default value text. `None` for containers and nulls.
    pub default: Option<String>,
    pub kind: EntryKind,
}

/// Raw source text of a key's value as written on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Single-line value with quotes and trailing comment removed.
    Inline(String),
    /// Block scalar (`|`, `>`, with optional chomping), dedented.
    Block(String),
    /// Nothing after the colon.
    Empty,
}

/// Line-pass facts about one key declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAnnotation {
    pub comment: String,
    pub raw: RawValue,
}

/// Map from dotted key path to [`KeyDocEntry`].
///
/// Read-only once built. Lookups try the exact path first and then the
/// normalized form (see [`normalize_path`]).
#[derive(Debug, Clone)]
pub struct KeyDocStore {
    entries: HashMap<String, KeyDocEntry>,
    /// Paths in first-declaration order.
    order: Vec<String>,
    /// Normalized path -> stored path. Later declarations win.
    normalized: HashMap<String, String>,
    tree: Value,
}

impl KeyDocStore {
    /// Build the store from the full text of a defaults document.
    ///
    /// Fails only when the text does not load as YAML. Keys whose value the
    /// structural load cannot reach are kept with an empty default.
    pub fn build(text: &str) -> Result<Self, KeyDocError> {
        let tree: Value = serde_yaml::from_str(text)?;

        let mut entries = HashMap::new();
        let mut order = Vec::new();
        let mut normalized = HashMap::new();

        for (path, annotation) in annotate_lines(text) {
            let entry = join_entry(&tree, &path, annotation);
            if entries.insert(path.clone(), entry).is_none() {
                order.push(path.clone());
            }
            normalized.insert(normalize_path(&path), path);
        }

        tracing::debug!(keys = order.len(), "built key documentation store");

        Ok(Self {
            entries,
            order,
            normalized,
            tree,
        })
    }

    /// Exact-path lookup.
    pub fn get(&self, path: &str) -> Option<&KeyDocEntry> {
        self.entries.get(path)
    }

    /// Exact lookup, falling back to the normalized form of `path`.
    pub fn lookup(&self, path: &str) -> Option<&KeyDocEntry> {
        if let Some(entry) = self.entries.get(path) {
            return Some(entry);
        }
        self.normalized
            .get(&normalize_path(path))
            .and_then(|stored| self.entries.get(stored))
    }

    /// Documented paths in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The structural load the store was built from.
    pub fn tree(&self) -> &Value {
        &self.tree
    }
}

/// Lower-case a path and turn `_` and `-` into `.`.
///
/// camelCase is left alone, so `GLOBAL_INGRESS_DOMAIN` matches
/// `global.ingress.domain` but not `global.ingressDomain`.
pub fn normalize_path(path: &str) -> String {
    path.replace(['_', '-'], ".").to_lowercase()
}

fn join_entry(tree: &Value, path: &str, annotation: LineAnnotation) -> KeyDocEntry {
    let LineAnnotation { comment, raw } = annotation;
    let (kind, default) = match lookup_value(tree, path) {
        Some(Value::Mapping(_)) => (EntryKind::Container, None),
        Some(Value::Sequence(_)) => (EntryKind::List, Some(String::new())),
        Some(Value::Null) => (EntryKind::Null, None),
        Some(Value::String(s)) => match raw {
            RawValue::Block(block) => (EntryKind::Scalar, Some(block)),
            _ => (EntryKind::Scalar, Some(s.clone())),
        },
        Some(v @ (Value::Bool(_) | Value::Number(_))) => match raw {
            RawValue::Inline(text) => (EntryKind::Scalar, Some(text)),
            _ => (EntryKind::Scalar, Some(scalar_text(v))),
        },
        Some(Value::Tagged(_)) | None => (EntryKind::Unresolved, Some(String::new())),
    };
    KeyDocEntry {
        description: comment,
        default,
        kind,
    }
}

/// Walk a dotted path through nested mappings.
pub(crate) fn lookup_value<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(tree, |node, segment| node.get(segment))
}

/// Display text for a non-container YAML value.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

/// Line pass: every `key:` line with its preceding comment block and raw
/// value, in encounter order. Duplicate paths are reported each time.
///
/// Comment lines accumulate across blank lines and are consumed by the next
/// key. Any other content line (list items, flow continuations) discards
/// them. Block scalar bodies are skipped whole, so a `#` inside a block is
/// never taken for a comment.
pub fn annotate_lines(text: &str) -> Vec<(String, LineAnnotation)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut annotations = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            let comment = trimmed.trim_matches(|c: char| c == '#' || c == ' ').trim();
            if !comment.is_empty() {
                pending.push(comment.to_string());
            }
            i += 1;
            continue;
        }
        if trimmed.is_empty() {
            i += 1;
            continue;
        }

        let Some(caps) = KEY_LINE.captures(line) else {
            pending.clear();
            i += 1;
            continue;
        };

        let indent = caps[1].len();
        while stack.last().is_some_and(|(level, _)| *level >= indent) {
            stack.pop();
        }
        stack.push((indent, caps[2].to_string()));
        let path = stack
            .iter()
            .map(|(_, key)| key.as_str())
            .collect::<Vec<_>>()
            .join(".");

        let rest = &line[caps.get(0).map_or(line.len(), |m| m.end())..];
        let mut consumed = 0;
        let raw = if opens_block_scalar(rest) {
            let (block, used) = read_block(&lines[i + 1..], indent);
            consumed = used;
            RawValue::Block(block)
        } else {
            inline_value(rest)
        };

        annotations.push((
            path,
            LineAnnotation {
                comment: pending.join(" "),
                raw,
            },
        ));
        pending.clear();
        i += 1 + consumed;
    }

    annotations
}

fn opens_block_scalar(rest: &str) -> bool {
    let indicator = strip_trailing_comment(rest).trim();
    let mut chars = indicator.chars();
    matches!(chars.next(), Some('|') | Some('>'))
        && chars.all(|c| c == '-' || c == '+' || c.is_ascii_digit())
}

/// Collect a block scalar body: blank lines and lines indented deeper than
/// the key. Returns the dedented text and the number of lines consumed.
fn read_block(following: &[&str], key_indent: usize) -> (String, usize) {
    let mut body: Vec<&str> = Vec::new();
    for line in following {
        if line.trim().is_empty() {
            body.push("");
            continue;
        }
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent <= key_indent {
            break;
        }
        body.push(line);
    }
    let consumed = body.len();

    let common = body
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    let dedented: Vec<&str> = body
        .iter()
        .map(|l| if l.is_empty() { "" } else { &l[common..] })
        .collect();

    (dedented.join("\n").trim_matches('\n').to_string(), consumed)
}

fn inline_value(rest: &str) -> RawValue {
    let value = strip_trailing_comment(rest).trim();
    if value.is_empty() {
        return RawValue::Empty;
    }
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            value
                .strip_prefix(*q)
                .and_then(|v| v.strip_suffix(*q))
        })
        .unwrap_or(value);
    RawValue::Inline(unquoted.to_string())
}

/// Drop a ` # comment` tail that sits outside quotes.
fn strip_trailing_comment(rest: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_is_space = true;
    for (idx, c) in rest.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' && prev_is_space => return &rest[..idx],
            None => {}
        }
        prev_is_space = c.is_whitespace();
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_documented_key() {
        let store = KeyDocStore::build("# Domain name\ndomain: example.com\n").unwrap();
        let entry = store.get("domain").unwrap();
        assert_eq!(entry.description, "Domain name");
        assert_eq!(entry.default.as_deref(), Some("example.com"));
        assert_eq!(entry.kind, EntryKind::Scalar);
    }

    #[test]
    fn test_nested_paths_and_container_marker() {
        let text = "\
global:
  # Ingress settings
  ingress:
    # Base domain for all hosts
    domainName: kyma.example.com
";
        let store = KeyDocStore::build(text).unwrap();
        let ingress = store.get("global.ingress").unwrap();
        assert_eq!(ingress.kind, EntryKind::Container);
        assert!(ingress.default.is_none());
        assert_eq!(ingress.description, "Ingress settings");

        let domain = store.get("global.ingress.domainName").unwrap();
        assert_eq!(domain.default.as_deref(), Some("kyma.example.com"));
        assert_eq!(domain.description, "Base domain for all hosts");
    }

    #[test]
    fn test_dedent_pops_path_stack() {
        let text = "a:\n  b:\n    c: 1\n  d: 2\ne: 3\n";
        let store = KeyDocStore::build(text).unwrap();
        let keys: Vec<&str> = store.keys().collect();
        assert_eq!(keys, vec!["a", "a.b", "a.b.c", "a.d", "e"]);
    }

    #[test]
    fn test_scalars_keep_source_text() {
        let text = "\
enabled: true
replicas: 2
version: 1.10
mask: 0x1F
quoted: \"false\"
";
        let store = KeyDocStore::build(text).unwrap();
        assert_eq!(store.get("enabled").unwrap().default.as_deref(), Some("true"));
        assert_eq!(store.get("replicas").unwrap().default.as_deref(), Some("2"));
        assert_eq!(store.get("version").unwrap().default.as_deref(), Some("1.10"));
        assert_eq!(store.get("mask").unwrap().default.as_deref(), Some("0x1F"));
        assert_eq!(store.get("quoted").unwrap().default.as_deref(), Some("false"));
    }

    #[test]
    fn test_multi_line_comment_joined_with_spaces() {
        let text = "\
# First line
#
#   second line
timeout: 30s
";
        let store = KeyDocStore::build(text).unwrap();
        assert_eq!(
            store.get("timeout").unwrap().description,
            "First line second line"
        );
    }

    #[test]
    fn test_blank_line_keeps_comment_content_line_drops_it() {
        let text = "\
# Survives the blank line

kept: a
list:
  - one
# Dropped by the next list item
  - two
after: b
";
        let store = KeyDocStore::build(text).unwrap();
        assert_eq!(store.get("kept").unwrap().description, "Survives the blank line");
        assert_eq!(store.get("after").unwrap().description, "");
    }

    #[test]
    fn test_list_value_gets_empty_default() {
        let store = KeyDocStore::build("zones:\n  - a\n  - b\n").unwrap();
        let entry = store.get("zones").unwrap();
        assert_eq!(entry.kind, EntryKind::List);
        assert_eq!(entry.default.as_deref(), Some(""));
    }

    #[test]
    fn test_unreachable_path_is_silent() {
        let text = "\
items:
  - name: first
    port: 1
";
        let store = KeyDocStore::build(text).unwrap();
        let entry = store.get("items.port").unwrap();
        assert_eq!(entry.kind, EntryKind::Unresolved);
        assert_eq!(entry.default.as_deref(), Some(""));
    }

    #[test]
    fn test_duplicate_path_last_declaration_wins() {
        let text = "\
items:
  - name: a
    # first port
    port: 1
  - name: b
    # second port
    port: 2
";
        let store = KeyDocStore::build(text).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("items.port").unwrap().description, "second port");
    }

    #[test]
    fn test_null_value() {
        let store = KeyDocStore::build("# Optional override\noverride:\n").unwrap();
        let entry = store.get("override").unwrap();
        assert_eq!(entry.kind, EntryKind::Null);
        assert!(entry.default.is_none());
    }

    #[test]
    fn test_block_scalar_raw_text_and_hash_lines() {
        let text = "\
# Startup script
script: |
  # not a comment
  echo start

    indented
# Next key
next: 1
";
        let store = KeyDocStore::build(text).unwrap();
        let script = store.get("script").unwrap();
        assert_eq!(
            script.default.as_deref(),
            Some("# not a comment\necho start\n\n  indented")
        );
        assert_eq!(script.description, "Startup script");
        assert_eq!(store.get("next").unwrap().description, "Next key");
    }

    #[test]
    fn test_block_scalar_trailing_blank_lines_trimmed() {
        let text = "script: |\n  line one\n  line two\n\n\n# Next key\nnext: 1\n";
        let store = KeyDocStore::build(text).unwrap();
        assert_eq!(
            store.get("script").unwrap().default.as_deref(),
            Some("line one\nline two")
        );
        assert_eq!(store.get("next").unwrap().description, "Next key");
    }

    #[test]
    fn test_trailing_comment_stripped_from_raw_value() {
        let annotations = annotate_lines("port: 8080 # http\nurl: \"http://x/#frag\"\n");
        assert_eq!(annotations[0].1.raw, RawValue::Inline("8080".to_string()));
        assert_eq!(
            annotations[1].1.raw,
            RawValue::Inline("http://x/#frag".to_string())
        );
    }

    #[test]
    fn test_normalized_lookup_fallback() {
        let store = KeyDocStore::build("global:\n  ingress:\n    domain: d.example\n").unwrap();
        assert!(store.get("GLOBAL_INGRESS_DOMAIN").is_none());
        let entry = store.lookup("GLOBAL_INGRESS_DOMAIN").unwrap();
        assert_eq!(entry.default.as_deref(), Some("d.example"));
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let result = KeyDocStore::build("key: [unclosed\n");
        assert!(matches!(result, Err(KeyDocError::Load(_))));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("GLOBAL_INGRESS-DOMAIN"), "global.ingress.domain");
        assert_eq!(normalize_path("global.ingressDomain"), "global.ingressdomain");
    }
}
