//! Parameter-safe SQL assembly.
//!
//! [`Sql`] stores SQL pieces and parameters separately. Compiled statements
//! use `?` placeholders throughout; [`Sql::render`] numbers them the way the
//! target engine expects.
//!
//! # Example
//!
//! ```ignore
//! use cql::{Dialector, Sql};
//!
//! let mut q = Sql::new("SELECT * FROM sellers WHERE ");
//! q.push("name = ").push_bind("Acme");
//! assert_eq!(q.render(Dialector::Postgres), "SELECT * FROM sellers WHERE name = $1");
//! ```

use crate::dialect::Dialector;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A SQL fragment with its bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let initial_sql: String = initial_sql.into();
        let mut sql = Self::empty();
        sql.push(&initial_sql);
        sql
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append `(?, ?, ...)` binding every value.
    pub fn push_bind_list(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.push("(");
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_bind(value);
        }
        self.push(")")
    }

    /// Append SQL that already contains `?` placeholders, binding `values` to
    /// them in order. Question marks inside quoted literals are left alone.
    pub fn push_fragment(&mut self, sql: &str, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.push_parts(split_placeholders(sql, false), values)
    }

    /// Like [`Sql::push_fragment`], with the literal syntax of `dialector`:
    /// MySQL also escapes quotes with a backslash (`'it\'s'`).
    pub fn push_fragment_for(
        &mut self,
        dialector: Dialector,
        sql: &str,
        values: impl IntoIterator<Item = Value>,
    ) -> &mut Self {
        let parts = split_placeholders(sql, dialector == Dialector::MySql);
        self.push_parts(parts, values)
    }

    fn push_parts(&mut self, parts: Vec<SqlPart>, values: impl IntoIterator<Item = Value>) -> &mut Self {
        for part in parts {
            match part {
                SqlPart::Raw(raw) => {
                    self.push(&raw);
                }
                SqlPart::Param => self.parts.push(SqlPart::Param),
            }
        }
        self.params.extend(values);
        self
    }

    /// Append another fragment, taking over its parameters.
    pub fn push_sql(&mut self, other: Sql) -> &mut Self {
        for part in other.parts {
            match part {
                SqlPart::Raw(raw) => {
                    self.push(&raw);
                }
                SqlPart::Param => self.parts.push(SqlPart::Param),
            }
        }
        self.params.extend(other.params);
        self
    }

    /// Append fragments separated by `separator`.
    pub fn push_joined(&mut self, fragments: Vec<Sql>, separator: &str) -> &mut Self {
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.push_sql(fragment);
        }
        self
    }

    /// SQL text with `?` placeholders.
    pub fn to_sql(&self) -> String {
        self.render_with(|_| "?".to_string())
    }

    /// SQL text with the dialect's native placeholders.
    pub fn render(&self, dialector: Dialector) -> String {
        self.render_with(|index| dialector.placeholder(index))
    }

    fn render_with(&self, placeholder: impl Fn(usize) -> String) -> String {
        let mut out = String::new();
        let mut index = 0;
        for part in &self.parts {
            match part {
                SqlPart::Raw(raw) => out.push_str(raw),
                SqlPart::Param => {
                    index += 1;
                    out.push_str(&placeholder(index));
                }
            }
        }
        out
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Number of placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count()
    }
}

/// Split SQL on `?` placeholders, skipping quoted literals and identifiers.
/// With `backslash_escapes`, a backslash inside a string literal escapes the
/// next character.
fn split_placeholders(sql: &str, backslash_escapes: bool) -> Vec<SqlPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in sql.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if escaped {
                    escaped = false;
                } else if backslash_escapes && ch == '\\' && q != '`' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' | '`' => {
                    current.push(ch);
                    quote = Some(ch);
                }
                '?' => {
                    if !current.is_empty() {
                        parts.push(SqlPart::Raw(std::mem::take(&mut current)));
                    }
                    parts.push(SqlPart::Param);
                }
                _ => current.push(ch),
            },
        }
    }
    if !current.is_empty() {
        parts.push(SqlPart::Raw(current));
    }
    parts
}

/// Rewrite the `?` placeholders of compiled SQL into the dialect's native form.
pub fn number_placeholders(sql: &str, dialector: Dialector) -> String {
    let mut out = Sql::empty();
    out.push_fragment_for(dialector, sql, Vec::new());
    out.render(dialector)
}
