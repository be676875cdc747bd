//! File-level analysis.

use crate::analyzer::{Analyzer, Joined};
use crate::config::LintConfig;
use crate::diagnostic::Diagnostic;
use crate::error::{LintError, LintResult};
use crate::frontend;
use crate::tree::SyntaxNode;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Outcome of analysing a set of files.
#[derive(Debug, Default)]
pub struct Report {
    /// Sorted by file, then position.
    pub diagnostics: Vec<Diagnostic>,
    /// Files that could not be read or parsed.
    pub errors: Vec<LintError>,
    pub files: usize,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.errors.is_empty()
    }
}

/// Analyse the Rust source of one file.
pub fn analyze_source(path: &Path, source: &str, config: &LintConfig) -> LintResult<Vec<Diagnostic>> {
    let file = syn::parse_file(source).map_err(|e| LintError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sites = frontend::call_sites(&file, &config.query_functions);

    // Models any call site of the file names, for telling field handles of
    // unsafe operands from other calls.
    let collector = Analyzer::new(config);
    let mut known = Joined::new();
    for site in &sites {
        if let Ok(models) = collector.models(site) {
            known.extend(models);
        }
    }

    let analyzer = Analyzer::new(config).with_known_models(known);
    let mut diagnostics = Vec::new();
    for site in &sites {
        match analyzer.call_site(site) {
            Ok(findings) => diagnostics.extend(
                findings
                    .into_iter()
                    .map(|finding| Diagnostic::unjoined(path, finding)),
            ),
            Err(e) => tracing::debug!(
                file = %path.display(),
                position = %site.position(),
                error = %e,
                "skipping call site"
            ),
        }
    }
    Ok(diagnostics)
}

pub fn analyze_file(path: &Path, config: &LintConfig) -> LintResult<Vec<Diagnostic>> {
    let source = std::fs::read_to_string(path).map_err(|source| LintError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let diagnostics = analyze_source(path, &source, config)?;
    tracing::trace!(file = %path.display(), diagnostics = diagnostics.len(), "analyzed");
    Ok(diagnostics)
}

/// Analyse `paths` in parallel. A file that fails is reported in
/// [`Report::errors`]; the others are still analysed.
pub fn analyze_files(paths: &[PathBuf], config: &LintConfig) -> Report {
    let results: Vec<LintResult<Vec<Diagnostic>>> = paths
        .par_iter()
        .map(|path| analyze_file(path, config))
        .collect();

    let mut report = Report {
        files: paths.len(),
        ..Report::default()
    };
    for result in results {
        match result {
            Ok(diagnostics) => report.diagnostics.extend(diagnostics),
            Err(e) => report.errors.push(e),
        }
    }
    report
        .diagnostics
        .sort_by(|a, b| (&a.file, a.position).cmp(&(&b.file, b.position)));
    tracing::debug!(
        files = report.files,
        diagnostics = report.diagnostics.len(),
        errors = report.errors.len(),
        "lint finished"
    );
    report
}
