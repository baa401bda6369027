//! Loading workflow documents from a workflow directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use portflow_types::WorkflowDocument;
use thiserror::Error;

/// Failures while locating, reading or parsing a workflow document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("workflow file '{filename}' not found in {}", directory.display())]
    NotFound { filename: String, directory: PathBuf },

    #[error("invalid workflow file name '{0}': expected a plain file name inside the workflow directory")]
    InvalidName(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse workflow '{filename}': {source}")]
    Parse {
        filename: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl DocumentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Load `filename` from `directory`.
///
/// `filename` must be a single path component; anything that could escape
/// the directory is rejected with [`DocumentError::InvalidName`].
pub fn load_document(directory: &Path, filename: &str) -> Result<WorkflowDocument, DocumentError> {
    ensure_plain_file_name(filename)?;

    let path = directory.join(filename);
    let content = fs::read_to_string(&path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DocumentError::NotFound {
            filename: filename.to_string(),
            directory: directory.to_path_buf(),
        },
        _ => DocumentError::Read { path: path.clone(), source },
    })?;

    parse_document(&content, filename)
}

/// Parse YAML workflow text. Blank documents parse to an empty workflow.
pub fn parse_document(content: &str, filename: &str) -> Result<WorkflowDocument, DocumentError> {
    if content.trim().is_empty() {
        return Ok(WorkflowDocument::default());
    }
    serde_yaml::from_str(content).map_err(|source| DocumentError::Parse {
        filename: filename.to_string(),
        source,
    })
}

fn ensure_plain_file_name(filename: &str) -> Result<(), DocumentError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == filename && !filename.contains(['/', '\\']) => Ok(()),
        _ => Err(DocumentError::InvalidName(filename.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_document_from_directory() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            temp_dir.path().join("onboard.yml"),
            "title: Onboard\ninputs:\n  service:\nsteps:\n  - action: load_resource\n",
        )
        .expect("write workflow");

        let document = load_document(temp_dir.path(), "onboard.yml").expect("load workflow");

        assert_eq!(document.title.as_deref(), Some("Onboard"));
        assert_eq!(document.steps.len(), 1);
        assert!(document.inputs.contains_key("service"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp_dir = tempfile::tempdir().expect("temp dir");

        let error = load_document(temp_dir.path(), "absent.yaml").expect_err("missing file");

        assert!(error.is_not_found(), "unexpected error: {error}");
    }

    #[test]
    fn rejects_path_traversal() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        for name in ["../secrets.yaml", "nested/flow.yaml", "/etc/passwd", "..", "", "."] {
            let error = load_document(temp_dir.path(), name).expect_err("name must be rejected");
            assert!(matches!(error, DocumentError::InvalidName(_)), "unexpected error for '{name}': {error}");
        }
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        fs::write(temp_dir.path().join("broken.yaml"), "steps: [unclosed\n").expect("write workflow");

        let error = load_document(temp_dir.path(), "broken.yaml").expect_err("parse failure");

        assert!(matches!(error, DocumentError::Parse { .. }), "unexpected error: {error}");
    }

    #[test]
    fn blank_document_is_empty_workflow() {
        let document = parse_document("\n   \n", "empty.yaml").expect("blank document");
        assert_eq!(document, WorkflowDocument::default());
    }
}
