//! Shared type definitions for Portflow.
//!
//! The engine, the CLI and the HTTP front end all exchange workflow documents
//! and discovery summaries through the types re-exported here.

pub mod workflow;

pub use workflow::{DEFAULT_INPUT_TYPE, InputDeclaration, InputSummary, WorkflowDocument, WorkflowSummary};
