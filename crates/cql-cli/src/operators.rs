use crate::cli::{Format, OperatorsArgs};
use colored::Colorize;
use cql::{Dialector, Function, Operator};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct Entry {
    name: &'static str,
    arity: String,
    /// Rendered SQL per dialect; dialects without support are left out.
    sql: BTreeMap<Dialector, String>,
}

fn operator_entries(dialects: &[Dialector]) -> Vec<Entry> {
    Operator::ALL
        .iter()
        .map(|op| Entry {
            name: op.name(),
            arity: op.arity().to_string(),
            sql: dialects
                .iter()
                .filter_map(|&d| {
                    let token = op.resolve(d).ok()?;
                    let token = if op.negated_on(d) {
                        format!("NOT {token}")
                    } else {
                        token.to_string()
                    };
                    Some((d, token))
                })
                .collect(),
        })
        .filter(|e| !e.sql.is_empty())
        .collect()
}

fn function_entries(dialects: &[Dialector]) -> Vec<Entry> {
    Function::ALL
        .iter()
        .map(|f| Entry {
            name: f.name(),
            arity: format!("exactly {}", f.arity()),
            sql: dialects
                .iter()
                .filter_map(|&d| {
                    let strategy = f.resolve(d).ok()?;
                    Some((d, strategy.apply("col", f.arity())))
                })
                .collect(),
        })
        .filter(|e| !e.sql.is_empty())
        .collect()
}

fn render_table(title: &str, entries: &[Entry], dialects: &[Dialector]) -> String {
    let mut out = format!("{}\n", title.bold());
    let name_width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0).max(4);

    out.push_str(&format!("  {:<name_width$}", "name"));
    for d in dialects {
        out.push_str(&format!("  {:<16}", d.name()));
    }
    out.push('\n');

    for entry in entries {
        out.push_str(&format!("  {:<name_width$}", entry.name));
        for d in dialects {
            let sql = entry.sql.get(d).map(String::as_str).unwrap_or("-");
            out.push_str(&format!("  {sql:<16}"));
        }
        out.push('\n');
    }
    out
}

pub fn run(args: OperatorsArgs) -> anyhow::Result<()> {
    let dialects: Vec<Dialector> = match args.dialect {
        Some(d) => vec![d],
        None => Dialector::ALL.to_vec(),
    };
    let operators = operator_entries(&dialects);
    let functions = function_entries(&dialects);

    match args.format {
        Format::Text => {
            print!("{}", render_table("Operators", &operators, &dialects));
            println!();
            print!("{}", render_table("Functions", &functions, &dialects));
        }
        Format::Json => {
            let json = serde_json::json!({
                "operators": operators,
                "functions": functions,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
