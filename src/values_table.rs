//! Chart defaults reference table (`| Parameter | Description | Default Value |`)
//!
//! Every leaf of `values.yaml` becomes one row, in document order.

use envdoc_extract::keydoc::scalar_text;
use envdoc_extract::{EntryKind, KeyDocStore};
use serde_yaml::Value;

use crate::table::{escape_cell, TableLayout};

/// Minimum run of characters before the key cell may break.
const KEY_BREAK_WIDTH: usize = 20;

/// Characters the key cell breaks after.
const KEY_BREAK_CHARS: [char; 2] = ['.', '_'];

/// One documented leaf of the defaults document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub key: String,
    pub description: String,
    pub default: Option<String>,
}

/// Walk the structural load of the defaults and collect one row per leaf.
pub fn collect_parameters(store: &KeyDocStore) -> Vec<ParameterRow> {
    let mut rows = Vec::new();
    let mut path = Vec::new();
    walk(store.tree(), &mut path, store, &mut rows);
    rows
}

fn walk(node: &Value, path: &mut Vec<String>, store: &KeyDocStore, rows: &mut Vec<ParameterRow>) {
    if let Value::Mapping(map) = node {
        for (key, child) in map {
            let Some(key) = key_text(key) else {
                continue;
            };
            path.push(key);
            walk(child, path, store, rows);
            path.pop();
        }
        return;
    }
    if path.is_empty() {
        return;
    }

    let key = path.join(".");
    let entry = store.get(&key);
    let default = match node {
        Value::Sequence(items) => Some(list_text(items)),
        Value::Tagged(_) => return,
        leaf => match entry {
            Some(e) if e.kind == EntryKind::Scalar => e.default.clone(),
            _ if leaf.is_null() => None,
            _ => Some(scalar_text(leaf)),
        },
    };
    let description = entry
        .map(|e| e.description.clone())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "-".to_string());

    rows.push(ParameterRow {
        key,
        description,
        default,
    });
}

fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(scalar_text(key)),
        _ => None,
    }
}

fn list_text(items: &[Value]) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", scalar_text(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render parameter rows as a Markdown table.
pub fn render_parameters(rows: &[ParameterRow]) -> String {
    let layout = TableLayout::Parameters;
    let mut out = format!("{}\n{}\n", layout.header(), layout.separator());
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            break_key(&row.key),
            escape_cell(&row.description),
            format_default(row.default.as_deref())
        ));
    }
    out
}

/// Backtick-quoted default, or `None` for nulls and `TBD` markers.
pub fn format_default(default: Option<&str>) -> String {
    let value = match default {
        None | Some("None") | Some("TBD") => return "None".to_string(),
        Some(value) => value,
    };
    let escaped = value
        .replace('|', "\\|")
        .replace('`', "\\`")
        .trim_matches('\n')
        .replace('\n', "  ");
    format!("`{}`", escaped)
}

/// Insert `<br>` after a `.` or `_` found at or past every
/// [`KEY_BREAK_WIDTH`] characters. Falls back to the last break character
/// inside the window, and stops breaking when there is none.
pub fn break_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= KEY_BREAK_WIDTH {
        return key.to_string();
    }

    let mut out = String::new();
    let mut start = 0;
    while chars.len() - start > KEY_BREAK_WIDTH {
        let forward = chars[start + KEY_BREAK_WIDTH..]
            .iter()
            .position(|c| KEY_BREAK_CHARS.contains(c))
            .map(|offset| start + KEY_BREAK_WIDTH + offset);
        let backward = || {
            chars[start..start + KEY_BREAK_WIDTH]
                .iter()
                .rposition(|c| KEY_BREAK_CHARS.contains(c))
                .map(|offset| start + offset)
        };
        let Some(at) = forward.or_else(backward) else {
            break;
        };
        out.extend(&chars[start..=at]);
        out.push_str("<br>");
        start = at + 1;
    }
    out.extend(&chars[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: &str = "\
# Broker settings
broker:
  # Listening port
  port: 8080
  # Enable debug logging
  debug: false
  # Allowed regions
  regions:
    - eu
    - us
  empty: []
  # Optional override
  override:
  # Startup script
  script: |
    echo a | tee
    echo b
# Pending decision
owner: TBD
";

    #[test]
    fn test_collect_parameters_in_document_order() {
        let store = KeyDocStore::build(VALUES).unwrap();
        let rows = collect_parameters(&store);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "broker.port",
                "broker.debug",
                "broker.regions",
                "broker.empty",
                "broker.override",
                "broker.script",
                "owner"
            ]
        );
        assert_eq!(rows[0].description, "Listening port");
        assert_eq!(rows[1].default.as_deref(), Some("false"));
        assert_eq!(rows[2].default.as_deref(), Some("- eu\n- us"));
        assert_eq!(rows[3].default.as_deref(), Some("[]"));
        assert_eq!(rows[3].description, "-");
        assert_eq!(rows[4].default, None);
        assert_eq!(rows[5].default.as_deref(), Some("echo a | tee\necho b"));
    }

    #[test]
    fn test_render_parameters() {
        let store = KeyDocStore::build(VALUES).unwrap();
        let table = render_parameters(&collect_parameters(&store));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Parameter | Description | Default Value |");
        assert_eq!(lines[1], "| --- | --- | --- |");
        assert_eq!(lines[2], "| broker.port | Listening port | `8080` |");
        assert_eq!(lines[4], "| broker.regions | Allowed regions | `- eu  - us` |");
        assert_eq!(lines[6], "| broker.override | Optional override | None |");
        assert_eq!(
            lines[7],
            "| broker.script | Startup script | `echo a \\| tee  echo b` |"
        );
        assert_eq!(lines[8], "| owner | Pending decision | None |");
    }

    #[test]
    fn test_break_key_forward_then_backward() {
        assert_eq!(break_key("short.key"), "short.key");
        assert_eq!(
            break_key("global.ingress.domainName.suffix"),
            "global.ingress.domainName.<br>suffix"
        );
        assert_eq!(
            break_key("a.bcdefghijklmnopqrstuvwxyz"),
            "a.<br>bcdefghijklmnopqrstuvwxyz"
        );
        assert_eq!(break_key("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnopqrstuvwxyz");
    }

    #[test]
    fn test_format_default() {
        assert_eq!(format_default(None), "None");
        assert_eq!(format_default(Some("TBD")), "None");
        assert_eq!(format_default(Some("a`b")), "`a\\`b`");
        assert_eq!(format_default(Some("\nx\ny\n")), "`x  y`");
    }
}
