//! Markdown reference tables
//!
//! Renders resolved env rows, reconciles them with the table a previous run
//! left in the document, and splices the result back in place:
//! - table-anchored: replace the first table with the expected header
//! - section-anchored: replace a run of known `###` sections
//!
//! A cell the current run could not resolve keeps whatever the previous
//! table showed for the same variable, so docs never regress to "unknown".

use std::collections::HashMap;

use envdoc_extract::PLACEHOLDER;

/// Zero-width space entity used as a line-break opportunity.
pub const SOFT_BREAK: &str = "&#x200b;";

/// Name cell break width.
pub const NAME_BREAK_WIDTH: usize = 20;

/// Value cell when nothing is known about a variable.
pub const UNKNOWN_VALUE: &str = "None";

/// The two fixed table shapes the tool writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// `| Environment Variable | Current Value | Description |`
    EnvVars,
    /// `| Parameter | Description | Default Value |`
    Parameters,
}

impl TableLayout {
    pub fn labels(self) -> [&'static str; 3] {
        match self {
            TableLayout::EnvVars => ["Environment Variable", "Current Value", "Description"],
            TableLayout::Parameters => ["Parameter", "Description", "Default Value"],
        }
    }

    pub fn header(self) -> String {
        format!("| {} |", self.labels().join(" | "))
    }

    pub fn separator(self) -> &'static str {
        match self {
            TableLayout::EnvVars => {
                "|---------------------|------------------------------|---------------------------------------------------------------|"
            }
            TableLayout::Parameters => "| --- | --- | --- |",
        }
    }

    /// Whether `line` is this layout's header row, ignoring cell padding.
    pub fn matches_header(self, line: &str) -> bool {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            return false;
        }
        let cells = split_cells(trimmed);
        cells.len() == 3
            && cells
                .iter()
                .zip(self.labels())
                .all(|(cell, label)| cell.trim() == label)
    }
}

/// One env variable ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub name: String,
    pub description: String,
    pub value: Option<String>,
}

/// Cells of a row from an earlier run, kept exactly as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousRow {
    pub value_cell: String,
    pub description_cell: String,
}

/// Previous rows keyed by bare variable name.
pub type PreviousTable = HashMap<String, PreviousRow>;

/// A `###` heading with the table rendered under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBlock {
    pub heading: String,
    pub table: String,
}

/// Collapse rows sharing a name into one.
///
/// The row keeps the position of the first occurrence and the content of
/// the last.
pub fn collapse_duplicates(rows: Vec<ResolvedRow>) -> Vec<ResolvedRow> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut collapsed: Vec<ResolvedRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match index.get(&row.name) {
            Some(&at) => collapsed[at] = row,
            None => {
                index.insert(row.name.clone(), collapsed.len());
                collapsed.push(row);
            }
        }
    }
    collapsed
}

/// Read the first env table found in `document`.
///
/// No table means no history: the map is empty.
pub fn parse_previous(document: &str) -> PreviousTable {
    let lines: Vec<&str> = document.lines().collect();
    let Some(start) = lines
        .iter()
        .position(|line| TableLayout::EnvVars.matches_header(line))
    else {
        return PreviousTable::new();
    };

    let mut previous = PreviousTable::new();
    for line in &lines[start + 1..table_end(&lines, start)] {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_separator_row(trimmed) {
            continue;
        }
        let cells = split_cells(trimmed);
        if cells.len() < 3 {
            continue;
        }
        let name = strip_artifacts(&cells[0]);
        if name.is_empty() {
            continue;
        }
        let last = cells.len() - 1;
        previous.insert(
            name,
            PreviousRow {
                value_cell: cells[1..last].join("|").trim().to_string(),
                description_cell: cells[last].trim().to_string(),
            },
        );
    }
    previous
}

/// Read the env table under `heading`, if the section exists.
pub fn parse_previous_section(document: &str, heading: &str) -> PreviousTable {
    let lines: Vec<&str> = document.lines().collect();
    let Some(start) = lines
        .iter()
        .position(|line| is_heading_line(line, heading))
    else {
        return PreviousTable::new();
    };
    let end = lines[start + 1..]
        .iter()
        .position(|line| is_heading(line))
        .map_or(lines.len(), |offset| start + 1 + offset);
    parse_previous(&lines[start..end].join("\n"))
}

/// Render rows as an env table, falling back to `previous` for cells this
/// run left empty.
pub fn render_env_table(rows: &[ResolvedRow], previous: &PreviousTable) -> String {
    let layout = TableLayout::EnvVars;
    let mut out = String::new();
    out.push_str(&layout.header());
    out.push('\n');
    out.push_str(layout.separator());
    out.push('\n');

    for row in rows {
        let history = previous.get(&row.name);
        let name_cell = format!("**{}**", soft_break_name(&row.name, NAME_BREAK_WIDTH));

        let value_cell = match row.value.as_deref() {
            Some(value) if is_known(value) => format!("<code>{}</code>", escape_cell(value)),
            resolved => match history {
                Some(h) => h.value_cell.clone(),
                None if resolved == Some(PLACEHOLDER) => PLACEHOLDER.to_string(),
                None => UNKNOWN_VALUE.to_string(),
            },
        };

        let description_cell = if is_known(&row.description) {
            escape_cell(&row.description)
        } else {
            history
                .map(|h| h.description_cell.clone())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };

        out.push_str(&format!(
            "| {} | {} | {} |\n",
            name_cell, value_cell, description_cell
        ));
    }
    out
}

/// Insert [`SOFT_BREAK`] every `width` characters, breaking right after the
/// last `_` of a chunk when there is one.
pub fn soft_break_name(text: &str, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if width == 0 || chars.len() <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut start = 0;
    while chars.len() - start > width {
        let chunk = &chars[start..start + width];
        let cut = chunk
            .iter()
            .rposition(|c| *c == '_')
            .map_or(width, |idx| idx + 1);
        out.extend(&chars[start..start + cut]);
        out.push_str(SOFT_BREAK);
        start += cut;
    }
    out.extend(&chars[start..]);
    out
}

/// Replace the first table with `layout`'s header, or append `table` when
/// there is none.
///
/// The replaced block runs from the header through the last contiguous
/// table row; blank lines between rows belong to it, blank lines after the
/// last row do not.
pub fn splice_table(document: &str, layout: TableLayout, table: &str) -> String {
    let lines: Vec<&str> = document.lines().collect();
    match lines.iter().position(|line| layout.matches_header(line)) {
        Some(start) => {
            let end = table_end(&lines, start);
            reassemble(document, &lines, start, end, table)
        }
        None => append_block(document, table),
    }
}

/// Replace the run of known sections, or append them when none is present.
///
/// The run starts at the first line beginning with one of the section
/// headings and ends before the next heading that is not one of them.
pub fn splice_sections(document: &str, sections: &[SectionBlock]) -> String {
    let rendered = render_sections(sections);
    let is_section_heading = |line: &str| {
        sections
            .iter()
            .any(|section| is_heading_line(line, &section.heading))
    };

    let lines: Vec<&str> = document.lines().collect();
    let Some(start) = lines.iter().position(|&line| is_section_heading(line)) else {
        // Re-runs against a document whose anchor heading was edited away
        // append a second copy.
        return append_block(document, &rendered);
    };
    let end = lines[start + 1..]
        .iter()
        .position(|&line| is_heading(line) && !is_section_heading(line))
        .map_or(lines.len(), |offset| start + 1 + offset);

    let replacement = if end < lines.len() {
        format!("{}\n", rendered)
    } else {
        rendered
    };
    reassemble(document, &lines, start, end, &replacement)
}

fn render_sections(sections: &[SectionBlock]) -> String {
    sections
        .iter()
        .map(|section| format!("{}\n\n{}", section.heading, section.table))
        .collect::<Vec<_>>()
        .join("\n")
}

fn reassemble(document: &str, lines: &[&str], start: usize, end: usize, block: &str) -> String {
    let mut out = String::new();
    for line in &lines[..start] {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(block);
    for line in &lines[end..] {
        out.push_str(line);
        out.push('\n');
    }
    if end < lines.len() && !document.ends_with('\n') {
        out.pop();
    }
    out
}

fn append_block(document: &str, block: &str) -> String {
    let mut out = document.to_string();
    if !out.trim().is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    } else {
        out.clear();
    }
    out.push_str(block);
    out
}

/// Exclusive end of the table block starting at `start`.
fn table_end(lines: &[&str], start: usize) -> usize {
    let mut last_row = start;
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('|') {
            last_row = start + 1 + offset;
        } else if !trimmed.is_empty() {
            break;
        }
    }
    last_row + 1
}

/// Whether `line` is exactly the heading line `heading`, ignoring
/// surrounding whitespace. `### Job` does not match `### Job B`.
fn is_heading_line(line: &str, heading: &str) -> bool {
    line.trim() == heading.trim()
}

fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn is_separator_row(trimmed: &str) -> bool {
    trimmed
        .chars()
        .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn is_known(text: &str) -> bool {
    !text.is_empty() && text != PLACEHOLDER
}

/// Split a `| a | b | c |` row on unescaped pipes.
fn split_cells(row: &str) -> Vec<String> {
    let inner = row.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = match inner.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => inner,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in inner.chars() {
        match c {
            '|' if !escaped => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
        escaped = c == '\\' && !escaped;
    }
    cells.push(current);
    cells
}

/// Escape characters that would break a table cell.
pub(crate) fn escape_cell(text: &str) -> String {
    text.trim_matches('\n')
        .replace('|', "\\|")
        .replace('\n', "<br>")
}

/// Bare variable name from a rendered name cell.
fn strip_artifacts(cell: &str) -> String {
    let mut name = cell.to_string();
    for artifact in ["**", SOFT_BREAK, "\u{200b}", "<br />", "<br/>", "<br>", "`"] {
        name = name.replace(artifact, "");
    }
    name.retain(|c| !c.is_whitespace());
    name
}
