//! Workflow documents on disk: loading by name and directory discovery.

pub mod catalog;
pub mod document;

pub use catalog::list_workflows;
pub use document::{DocumentError, load_document, parse_document};
