//! Diagnostics reported to the user.

use crate::analyzer::Finding;
use crate::tree::Position;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

// ── Lint codes ──────────────────────────────────────────────────────

/// A field of a model the statement does not join.
pub const LINT_J001: &str = "J001";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    #[serde(flatten)]
    pub position: Position,
    pub code: &'static str,
    pub model: String,
    pub message: String,
}

impl Diagnostic {
    pub fn unjoined(file: &Path, finding: Finding) -> Self {
        Self {
            file: file.to_path_buf(),
            position: finding.position,
            code: LINT_J001,
            message: format!("{} is not joined by the query", finding.model),
            model: finding.model,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.file.display(),
            self.position,
            self.message,
            self.code
        )
    }
}
