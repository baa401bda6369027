//! Discovery of workflow documents in a directory.

use std::fs;
use std::io;
use std::path::Path;

use portflow_types::WorkflowSummary;
use tracing::warn;

use super::document::{DocumentError, load_document};

/// Summaries of every `.yaml`/`.yml` file in `directory`, sorted by file name.
///
/// A missing directory yields an empty list. Files that fail to parse are
/// skipped with a warning so one broken document does not hide the others.
pub fn list_workflows(directory: &Path) -> Result<Vec<WorkflowSummary>, DocumentError> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(DocumentError::Read {
                path: directory.to_path_buf(),
                source,
            });
        }
    };

    let mut filenames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DocumentError::Read {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !has_workflow_extension(&path) {
            continue;
        }
        if let Some(filename) = path.file_name().and_then(|name| name.to_str()) {
            filenames.push(filename.to_string());
        }
    }
    filenames.sort();

    let mut summaries = Vec::with_capacity(filenames.len());
    for filename in filenames {
        match load_document(directory, &filename) {
            Ok(document) => summaries.push(document.summary(filename)),
            Err(error) => warn!(file = %filename, error = %error, "skipping unreadable workflow"),
        }
    }
    Ok(summaries)
}

fn has_workflow_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml"))
}
