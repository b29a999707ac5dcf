//! Line patterns shared by the scanners.

use regex_lite::Regex;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern must compile")
}

/// `key:` at any indent. Group 1 is the indent, group 2 the key.
pub(crate) static KEY_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(\s*)([A-Za-z0-9_\-]+):"));

/// Opening of a container `env:` list.
pub(crate) static ENV_HEADER: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*env:\s*$"));

/// Opening of a container `ports:` list. Closes the env block.
pub(crate) static PORTS_HEADER: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*ports:"));

/// `- name: IDENTIFIER` inside an env block.
pub(crate) static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*-\s*name:\s*([A-Z0-9_]+)"));

/// Any `- name:` list entry, whatever the name looks like.
pub(crate) static ANY_NAME_ENTRY: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*-\s*name:"));

/// Two `.Values` references in two separate template actions on one line.
pub(crate) static COMPOSITE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\{\{.*\.Values\..*\}\}.*\{\{.*\.Values\..*\}\}"));

/// Everything after `value:`, minus optional surrounding double quotes.
pub(crate) static RAW_VALUE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"value:\s*"?(.+?)"?\s*$"#));

/// `value:` holding a single `{{ ... }}` action. Group 1 is the whole span.
pub(crate) static TEMPLATE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"value:\s*"?(\{\{.*?\}\})"#));

/// One `{{ ... }}` action. Group 1 is the body.
pub(crate) static TEMPLATE_ACTION: LazyLock<Regex> = LazyLock::new(|| compile(r"\{\{(.*?)\}\}"));

/// A `.Values.a.b.c` reference. Group 1 is the dotted path.
pub(crate) static VALUES_REF: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\.Values\.([A-Za-z0-9_.]+)"));
