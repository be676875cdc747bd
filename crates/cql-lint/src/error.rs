//! Error types for cql-lint

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cql-lint operations.
pub type LintResult<T> = Result<T, LintError>;

/// A file that could not be analyzed. Reported per file, never fatal to a run.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

impl LintError {
    pub fn path(&self) -> &PathBuf {
        match self {
            LintError::Io { path, .. } | LintError::Parse { path, .. } => path,
        }
    }
}

/// A call site whose shape the analyzer could not follow.
///
/// Internal: the call site is skipped and analysis goes on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot inspect call site: {0}")]
pub struct InspectError(pub String);

impl InspectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
