//! Run orchestration
//!
//! Builds the key documentation store once, then regenerates every output
//! document listed in the config, in order:
//! - read manifests, extract declarations, resolve against the store
//! - read the existing document for history (missing file = no history)
//! - render, reconcile and splice the table back in place
//! - write, unless running in check mode

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use envdoc_extract::{extract_multi, extract_single, resolve, Declaration, KeyDocError, KeyDocStore};
use serde::Serialize;
use thiserror::Error;

use crate::config::{DocgenConfig, DocumentJob, DocumentMode, SectionSpec};
use crate::table::{
    collapse_duplicates, parse_previous, parse_previous_section, render_env_table,
    splice_sections, splice_table, ResolvedRow, SectionBlock, TableLayout,
};
use crate::values_table::{collect_parameters, render_parameters};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum DocgenError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to load defaults {}: {source}", path.display())]
    KeyDoc { path: PathBuf, source: KeyDocError },

    #[error(
        "{} has {available} document(s) declaring env variables, index {index} requested",
        manifest.display()
    )]
    SectionDocument {
        manifest: PathBuf,
        index: usize,
        available: usize,
    },
}

/// Result type for pipeline operations
pub type DocgenResult<T> = Result<T, DocgenError>;

/// Whether a run writes its output documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Write,
    /// Compute everything, write nothing.
    Check,
}

/// Outcome for one output document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub output: PathBuf,
    /// Rows rendered across all tables of the document
    pub rows: usize,
    /// Whether the regenerated document differs from what was on disk
    pub changed: bool,
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub check: bool,
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    /// Documents whose content on disk is out of date.
    pub fn stale(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| d.changed)
    }

    pub fn is_up_to_date(&self) -> bool {
        self.stale().next().is_none()
    }
}

/// Regenerated document text plus the number of rows it carries.
struct Generated {
    text: String,
    rows: usize,
}

/// Regenerate every document in `config`.
pub fn run(config: &DocgenConfig, mode: RunMode) -> DocgenResult<RunReport> {
    let store = load_store(&config.defaults)?;
    tracing::debug!(keys = store.len(), defaults = %config.defaults.display(), "loaded key docs");

    let mut documents = Vec::with_capacity(config.documents.len());
    for job in &config.documents {
        documents.push(run_document(job, &store, mode)?);
    }

    Ok(RunReport {
        check: mode == RunMode::Check,
        documents,
    })
}

/// Build the store from the defaults document at `path`.
pub fn load_store(path: &Path) -> DocgenResult<KeyDocStore> {
    let text = read_required(path)?;
    KeyDocStore::build(&text).map_err(|source| DocgenError::KeyDoc {
        path: path.to_path_buf(),
        source,
    })
}

fn run_document(job: &DocumentJob, store: &KeyDocStore, mode: RunMode) -> DocgenResult<DocumentReport> {
    let existing = read_optional(&job.output)?;
    let base = match existing.as_deref() {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => job.preamble(),
    };
    let generated = generate_document(job, store, &base)?;
    let changed = existing.as_deref() != Some(generated.text.as_str());

    if mode == RunMode::Write && changed {
        write_document(&job.output, &generated.text)?;
        tracing::info!(output = %job.output.display(), rows = generated.rows, "document written");
    } else {
        tracing::debug!(output = %job.output.display(), changed, "document not written");
    }

    Ok(DocumentReport {
        output: job.output.clone(),
        rows: generated.rows,
        changed,
    })
}

/// Produce the new text of one document from its current text.
fn generate_document(job: &DocumentJob, store: &KeyDocStore, existing: &str) -> DocgenResult<Generated> {
    match &job.mode {
        DocumentMode::Table {
            manifests,
            multi_document,
        } => {
            let mut declarations = Vec::new();
            for manifest in manifests {
                let text = read_required(manifest)?;
                if *multi_document {
                    declarations.extend(extract_multi(&text).into_iter().flatten());
                } else {
                    declarations.extend(extract_single(&text));
                }
            }
            let rows = resolve_rows(declarations, store);
            let table = render_env_table(&rows, &parse_previous(existing));
            Ok(Generated {
                text: splice_table(existing, TableLayout::EnvVars, &table),
                rows: rows.len(),
            })
        }
        DocumentMode::Sections { sections } => {
            let mut blocks = Vec::with_capacity(sections.len());
            let mut total = 0;
            for section in sections {
                let rows = resolve_rows(section_declarations(section)?, store);
                let previous = parse_previous_section(existing, &section.heading);
                total += rows.len();
                blocks.push(SectionBlock {
                    heading: section.heading.clone(),
                    table: render_env_table(&rows, &previous),
                });
            }
            Ok(Generated {
                text: splice_sections(existing, &blocks),
                rows: total,
            })
        }
        DocumentMode::Values => {
            let rows = collect_parameters(store);
            let table = render_parameters(&rows);
            Ok(Generated {
                text: splice_table(existing, TableLayout::Parameters, &table),
                rows: rows.len(),
            })
        }
    }
}

fn section_declarations(section: &SectionSpec) -> DocgenResult<Vec<Declaration>> {
    let text = read_required(&section.manifest)?;
    let Some(index) = section.document else {
        return Ok(extract_single(&text));
    };
    let mut documents = extract_multi(&text);
    let available = documents.len();
    if index >= available {
        return Err(DocgenError::SectionDocument {
            manifest: section.manifest.clone(),
            index,
            available,
        });
    }
    Ok(documents.swap_remove(index))
}

/// Resolve declarations into rows, one per distinct name.
pub fn resolve_rows(declarations: Vec<Declaration>, store: &KeyDocStore) -> Vec<ResolvedRow> {
    let rows = declarations
        .into_iter()
        .map(|declaration| {
            let resolution = resolve(declaration.expression.as_deref(), store);
            ResolvedRow {
                name: declaration.name,
                description: resolution.description,
                value: resolution.value,
            }
        })
        .collect();
    collapse_duplicates(rows)
}

fn read_required(path: &Path) -> DocgenResult<String> {
    fs::read_to_string(path).map_err(|source| DocgenError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional(path: &Path) -> DocgenResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DocgenError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_document(path: &Path, text: &str) -> DocgenResult<()> {
    let write_err = |source| DocgenError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, text).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> KeyDocStore {
        KeyDocStore::build("# Port\nport: 8080\n# Host\nhost: local\n").unwrap()
    }

    #[test]
    fn test_resolve_rows_collapses_duplicates() {
        let declarations = vec![
            Declaration::new("PORT", Some("{{ .Values.host }}")),
            Declaration::new("HOST", Some("{{ .Values.host }}")),
            Declaration::new("PORT", Some("{{ .Values.port }}")),
        ];
        let rows = resolve_rows(declarations, &store());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "PORT");
        assert_eq!(rows[0].value.as_deref(), Some("8080"));
        assert_eq!(rows[1].name, "HOST");
    }

    #[test]
    fn test_external_declaration_has_no_value() {
        let rows = resolve_rows(vec![Declaration::new("SECRET", None)], &store());
        assert_eq!(rows[0].description, "");
        assert_eq!(rows[0].value, None);
    }

    #[test]
    fn test_read_optional_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_optional(&dir.path().join("absent.md")).unwrap(), None);
    }

    #[test]
    fn test_write_document_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs/nested/out.md");
        write_document(&path, "x\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "x\n");
    }

    #[test]
    fn test_report_serializes_for_json_output() {
        let report = RunReport {
            check: false,
            documents: vec![DocumentReport {
                output: PathBuf::from("docs/a.md"),
                rows: 3,
                changed: true,
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["check"], false);
        assert_eq!(json["documents"][0]["output"], "docs/a.md");
        assert_eq!(json["documents"][0]["rows"], 3);
    }

    #[test]
    fn test_report_staleness() {
        let report = RunReport {
            check: true,
            documents: vec![
                DocumentReport {
                    output: PathBuf::from("a.md"),
                    rows: 1,
                    changed: false,
                },
                DocumentReport {
                    output: PathBuf::from("b.md"),
                    rows: 2,
                    changed: true,
                },
            ],
        };
        assert!(!report.is_up_to_date());
        assert_eq!(report.stale().count(), 1);
    }
}
