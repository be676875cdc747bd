//! Target SQL engines.

use crate::error::CqlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a target SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialector {
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
}

impl Dialector {
    /// Every supported dialect, in catalog order.
    pub const ALL: [Dialector; 4] = [
        Dialector::Postgres,
        Dialector::MySql,
        Dialector::Sqlite,
        Dialector::SqlServer,
    ];

    /// Lowercase name used in configuration and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Dialector::Postgres => "postgres",
            Dialector::MySql => "mysql",
            Dialector::Sqlite => "sqlite",
            Dialector::SqlServer => "sqlserver",
        }
    }

    /// Native placeholder for the 1-based parameter `index`.
    ///
    /// Compiled statements use `?` throughout; this is what
    /// [`Statement::native_sql`](crate::Statement::native_sql) rewrites them to.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialector::Postgres => format!("${index}"),
            Dialector::SqlServer => format!("@p{index}"),
            Dialector::MySql | Dialector::Sqlite => "?".to_string(),
        }
    }

    /// Quote an identifier such as a column alias.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Dialector::MySql => format!("`{}`", ident.replace('`', "``")),
            _ => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }
}

impl fmt::Display for Dialector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialector {
    type Err = CqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "psql" => Ok(Dialector::Postgres),
            "mysql" => Ok(Dialector::MySql),
            "sqlite" | "sqlite3" => Ok(Dialector::Sqlite),
            "sqlserver" | "mssql" => Ok(Dialector::SqlServer),
            other => Err(CqlError::UnknownDialector(other.to_string())),
        }
    }
}
