//! Run configuration (`docgen.toml`)
//!
//! Lists the chart defaults document and, per output document, which
//! manifests feed it and how the table is placed. Loaded once and passed
//! into the run; nothing mutates it afterwards.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "docgen.toml";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocgenConfig {
    /// Chart defaults document (`values.yaml`)
    pub defaults: PathBuf,

    /// Output documents, generated in order
    #[serde(default, rename = "document")]
    pub documents: Vec<DocumentJob>,
}

/// One output document and where its rows come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentJob {
    /// Markdown document the table is spliced into
    pub output: PathBuf,

    /// `##` heading written when the document is created from scratch
    #[serde(default)]
    pub title: Option<String>,

    /// Paragraph written under [`title`](Self::title) on creation
    #[serde(default)]
    pub intro: Option<String>,

    #[serde(flatten)]
    pub mode: DocumentMode,
}

/// How a document's table is produced and placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DocumentMode {
    /// One env table built from every listed manifest, table-anchored
    Table {
        manifests: Vec<PathBuf>,
        /// Split manifests on `---` before scanning
        #[serde(default)]
        multi_document: bool,
    },
    /// One heading + env table per section, section-anchored
    Sections { sections: Vec<SectionSpec> },
    /// Parameter table of the defaults document itself
    Values,
}

/// A named subsection of a sections-mode document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Full heading line, e.g. `### Runtime Reconciler`
    pub heading: String,

    pub manifest: PathBuf,

    /// Index into the manifest's documents that declare env variables.
    /// When unset the manifest is scanned as one document.
    #[serde(default)]
    pub document: Option<usize>,
}

impl DocgenConfig {
    /// Load config from a TOML file, resolving relative paths against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    /// Parse and validate config from a TOML string. Paths are kept as
    /// written.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: DocgenConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.documents.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one [[document]] must be defined".to_string(),
            ));
        }

        let mut outputs = HashSet::new();
        for job in &self.documents {
            if !outputs.insert(&job.output) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate output document '{}'",
                    job.output.display()
                )));
            }
            job.validate()?;
        }

        Ok(())
    }

    /// Rebase every relative path onto `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        self.defaults = rebase(base, &self.defaults);
        for job in &mut self.documents {
            job.output = rebase(base, &job.output);
            match &mut job.mode {
                DocumentMode::Table { manifests, .. } => {
                    for manifest in manifests.iter_mut() {
                        *manifest = rebase(base, manifest);
                    }
                }
                DocumentMode::Sections { sections } => {
                    for section in sections.iter_mut() {
                        section.manifest = rebase(base, &section.manifest);
                    }
                }
                DocumentMode::Values => {}
            }
        }
        self
    }
}

impl DocumentJob {
    /// Opening text for a document that does not exist yet or is blank.
    /// Empty when no title is configured.
    pub fn preamble(&self) -> String {
        let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return String::new();
        };
        let mut out = format!("## {}\n", title.trim_start_matches('#').trim_start());
        if let Some(intro) = self.intro.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
            out.push('\n');
            out.push_str(intro);
            out.push('\n');
        }
        out
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let output = self.output.display();
        match &self.mode {
            DocumentMode::Table { manifests, .. } => {
                if manifests.is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "Document '{}': table mode needs at least one manifest",
                        output
                    )));
                }
            }
            DocumentMode::Sections { sections } => {
                if sections.is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "Document '{}': sections mode needs at least one section",
                        output
                    )));
                }
                let mut headings = HashSet::new();
                for section in sections {
                    if !section.heading.trim_start().starts_with('#') {
                        return Err(ConfigError::ValidationError(format!(
                            "Document '{}': heading '{}' must start with '#'",
                            output, section.heading
                        )));
                    }
                    if !headings.insert(section.heading.trim()) {
                        return Err(ConfigError::ValidationError(format!(
                            "Document '{}': duplicate heading '{}'",
                            output, section.heading
                        )));
                    }
                }
            }
            DocumentMode::Values => {}
        }
        Ok(())
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
