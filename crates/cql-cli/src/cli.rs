use clap::{Args, Parser, Subcommand, ValueEnum};
use cql::Dialector;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cql", version, about = "Join-safety lint and operator catalog for cql")]
pub struct Cli {
    /// Log at debug level unless CQL_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report dynamic field references to models a statement does not join.
    Lint(LintArgs),
    /// List operators and functions with their SQL per dialect.
    Operators(OperatorsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct LintArgs {
    /// Files or directories to analyze. Defaults to the config's `include` globs.
    pub paths: Vec<PathBuf>,

    #[arg(long, default_value = "cql.toml")]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Exit with an error when anything is reported.
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct OperatorsArgs {
    /// Only list what this dialect supports.
    #[arg(long)]
    pub dialect: Option<Dialector>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}
