//! envdoc - environment variable reference docs for Helm charts
//!
//! Regenerates the Markdown tables that document a chart's environment
//! variables and defaults. Declarations come from templated deployment
//! manifests, descriptions and defaults from the commented `values.yaml`,
//! and cells a run cannot resolve keep what the previous table showed.

pub mod config;
pub mod pipeline;
pub mod table;
pub mod values_table;

pub use config::{ConfigError, DocgenConfig, DocumentJob, DocumentMode, SectionSpec};
pub use pipeline::{run, DocgenError, DocumentReport, RunMode, RunReport};
pub use table::{ResolvedRow, TableLayout};
