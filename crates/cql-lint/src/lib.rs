//! cql-lint
//!
//! Static join-safety analysis for cql statements.
//!
//! A cross-model comparison (`field.is_dynamic().eq(Other::field())`) compiles
//! to SQL referencing `Other`'s table, which exists only if the statement
//! joins `Other`. The type system cannot see joins, so this crate finds every
//! `query`/`update`/`delete` chain in Rust sources and reports references to
//! models the chain never joins.
//!
//! # Example
//!
//! ```ignore
//! use cql_lint::{LintConfig, analyze_source};
//! use std::path::Path;
//!
//! let source = r#"
//! fn f() {
//!     query::<Phone>(vec![
//!         Phone::brand(vec![Brand::name().is_dynamic().eq(City::name()).into()]).into(),
//!     ]);
//! }
//! "#;
//! let diagnostics = analyze_source(Path::new("a.rs"), source, &LintConfig::default())?;
//! assert_eq!(diagnostics[0].message, "City is not joined by the query");
//! ```

pub mod analyzer;
pub mod config;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod tree;

pub use analyzer::{Analyzer, Finding};
pub use config::LintConfig;
pub use diagnostic::{Diagnostic, LINT_J001};
pub use driver::{Report, analyze_file, analyze_files, analyze_source};
pub use error::{InspectError, LintError, LintResult};
pub use tree::{CallTree, NodeKind, Position, SyntaxNode};
