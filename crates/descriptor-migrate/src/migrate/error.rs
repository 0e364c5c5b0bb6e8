use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid descriptor: {0}")]
    Document(#[from] descriptor_yaml::Error),

    #[error("Failed to {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{section}' entry is missing required field '{field}'")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    #[error("Invalid script package name '{0}': must be a single path component")]
    InvalidPackage(String),

    #[error("Expected '{key}' to be a {expected}, found {found}")]
    UnexpectedType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl MigrationError {
    /// Wrap an IO failure on `path`. A missing path becomes [`MigrationError::NotFound`].
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path.to_path_buf());
        }
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn unexpected(
        key: impl Into<String>,
        expected: &'static str,
        found: &descriptor_yaml::Value,
    ) -> Self {
        Self::UnexpectedType {
            key: key.into(),
            expected,
            found: descriptor_yaml::kind_name(found),
        }
    }
}
