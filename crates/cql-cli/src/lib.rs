mod cli;
mod config;
mod lint;
mod logging;
mod operators;

use clap::Parser;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cli = cli::Cli::parse_from(args);
    logging::init(cli.verbose);

    match cli.command {
        cli::Command::Lint(args) => lint::run(args),
        cli::Command::Operators(args) => operators::run(args),
    }
}
