use crate::cli::{Format, LintArgs};
use crate::config::ProjectConfig;
use colored::Colorize;
use cql_lint::{Diagnostic, Report, analyze_files};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn run(args: LintArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_default(&args.config)?;
    let files = if args.paths.is_empty() {
        include_files(&project)?
    } else {
        expand_paths(&args.paths)?
    };
    if files.is_empty() {
        anyhow::bail!("no Rust files to lint (pass paths or set lint.include)");
    }

    let report = analyze_files(&files, &project.file.lint.rules);
    match args.format {
        Format::Text => print!("{}", render_text(&report)),
        Format::Json => println!("{}", render_json(&report)?),
    }

    let deny_warnings = args.deny_warnings || project.file.lint.deny_warnings;
    if deny_warnings && !report.is_clean() {
        anyhow::bail!(
            "lint failed: {} diagnostic(s), {} file error(s)",
            report.diagnostics.len(),
            report.errors.len()
        );
    }
    Ok(())
}

fn include_files(project: &ProjectConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in &project.file.lint.include {
        let pattern = project.resolve_path(pattern);
        files.extend(glob_files(&pattern.to_string_lossy())?);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Files stay as given; directories are searched for `.rs` files.
fn expand_paths(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(glob_files(&path.join("**/*.rs").to_string_lossy())?);
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn glob_files(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|e| anyhow::anyhow!("invalid glob {pattern:?}: {e}"))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| anyhow::anyhow!("failed to read {pattern:?}: {e}"))?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn render_diagnostic(d: &Diagnostic) -> String {
    format!(
        "{}:{}: {}: {} [{}]",
        d.file.display(),
        d.position,
        "warning".yellow().bold(),
        d.message,
        d.code
    )
}

fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for d in &report.diagnostics {
        out.push_str(&render_diagnostic(d));
        out.push('\n');
    }
    for e in &report.errors {
        out.push_str(&format!("{}: {e}\n", "error".red().bold()));
    }

    let summary = format!(
        "{} file(s) checked, {} diagnostic(s), {} file error(s)",
        report.files,
        report.diagnostics.len(),
        report.errors.len()
    );
    if report.is_clean() {
        out.push_str(&format!("{}\n", summary.green()));
    } else {
        out.push_str(&format!("{summary}\n"));
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: usize,
    diagnostics: &'a [Diagnostic],
    errors: Vec<JsonError<'a>>,
}

#[derive(Serialize)]
struct JsonError<'a> {
    file: &'a Path,
    message: String,
}

fn render_json(report: &Report) -> anyhow::Result<String> {
    let json = JsonReport {
        files: report.files,
        diagnostics: &report.diagnostics,
        errors: report
            .errors
            .iter()
            .map(|e| JsonError {
                file: e.path(),
                message: e.to_string(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
