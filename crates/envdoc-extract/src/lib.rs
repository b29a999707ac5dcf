//! Extraction engine for Helm chart reference documentation.
//!
//! Three stages, all operating on in-memory text:
//! - [`keydoc`] turns a commented `values.yaml` into a map from dotted key
//!   path to description and default value.
//! - [`declarations`] recovers `env` declarations and their raw value
//!   expressions from templated deployment manifests.
//! - [`resolver`] resolves each expression against the key map.

mod patterns;

pub mod declarations;
pub mod keydoc;
pub mod resolver;

pub use declarations::{extract_multi, extract_single, Declaration};
pub use keydoc::{normalize_path, EntryKind, KeyDocEntry, KeyDocError, KeyDocStore};
pub use resolver::{classify, resolve, ExpressionKind, Resolution, PLACEHOLDER};
