//! Operator catalog.
//!
//! Every operator carries its SQL token, a name used in diagnostics and an
//! optional dialect restriction. Operators without a restriction render the
//! same way on every engine.

use crate::dialect::Dialector;
use crate::error::{CqlError, CqlResult};
use std::fmt;

/// Comparison and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtOrEq,
    Gt,
    GtOrEq,
    Between,
    NotBetween,
    IsDistinct,
    IsNotDistinct,
    IsNull,
    IsNotNull,
    Like,
    Escape,
    ArrayIn,
    ArrayNotIn,
    And,
    Or,
    Not,
    MySqlXor,
    MySqlRegexp,
    MySqlNullSafeEqual,
    PostgresILike,
    PostgresSimilarTo,
    PostgresPosixMatch,
    PostgresPosixIMatch,
    SqliteGlob,
}

/// Number of values an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == expected,
            Arity::AtLeast(min) => n >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

impl Operator {
    /// The full catalog.
    pub const ALL: &'static [Operator] = &[
        Operator::Eq,
        Operator::NotEq,
        Operator::Lt,
        Operator::LtOrEq,
        Operator::Gt,
        Operator::GtOrEq,
        Operator::Between,
        Operator::NotBetween,
        Operator::IsDistinct,
        Operator::IsNotDistinct,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Like,
        Operator::Escape,
        Operator::ArrayIn,
        Operator::ArrayNotIn,
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::MySqlXor,
        Operator::MySqlRegexp,
        Operator::MySqlNullSafeEqual,
        Operator::PostgresILike,
        Operator::PostgresSimilarTo,
        Operator::PostgresPosixMatch,
        Operator::PostgresPosixIMatch,
        Operator::SqliteGlob,
    ];

    /// Standard SQL token, independent of the dialect.
    pub fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::LtOrEq => "<=",
            Operator::Gt => ">",
            Operator::GtOrEq => ">=",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::IsDistinct => "IS DISTINCT FROM",
            Operator::IsNotDistinct => "IS NOT DISTINCT FROM",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Like => "LIKE",
            Operator::Escape => "ESCAPE",
            Operator::ArrayIn => "IN",
            Operator::ArrayNotIn => "NOT IN",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::MySqlXor => "XOR",
            Operator::MySqlRegexp => "REGEXP",
            Operator::MySqlNullSafeEqual => "<=>",
            Operator::PostgresILike => "ILIKE",
            Operator::PostgresSimilarTo => "SIMILAR TO",
            Operator::PostgresPosixMatch => "~",
            Operator::PostgresPosixIMatch => "~*",
            Operator::SqliteGlob => "GLOB",
        }
    }

    /// Human readable name, prefixed by the engine for restricted operators.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Eq => "Eq",
            Operator::NotEq => "NotEq",
            Operator::Lt => "Lt",
            Operator::LtOrEq => "LtOrEq",
            Operator::Gt => "Gt",
            Operator::GtOrEq => "GtOrEq",
            Operator::Between => "Between",
            Operator::NotBetween => "NotBetween",
            Operator::IsDistinct => "IsDistinct",
            Operator::IsNotDistinct => "IsNotDistinct",
            Operator::IsNull => "IsNull",
            Operator::IsNotNull => "IsNotNull",
            Operator::Like => "Like",
            Operator::Escape => "Escape",
            Operator::ArrayIn => "ArrayIn",
            Operator::ArrayNotIn => "ArrayNotIn",
            Operator::And => "And",
            Operator::Or => "Or",
            Operator::Not => "Not",
            Operator::MySqlXor => "mysql.Xor",
            Operator::MySqlRegexp => "mysql.Regexp",
            Operator::MySqlNullSafeEqual => "mysql.NullSafeEqual",
            Operator::PostgresILike => "psql.ILike",
            Operator::PostgresSimilarTo => "psql.SimilarTo",
            Operator::PostgresPosixMatch => "psql.PosixMatch",
            Operator::PostgresPosixIMatch => "psql.PosixIMatch",
            Operator::SqliteGlob => "sqlite.Glob",
        }
    }

    /// The only dialect this operator exists in, if restricted.
    pub fn dialector(self) -> Option<Dialector> {
        match self {
            Operator::MySqlXor | Operator::MySqlRegexp | Operator::MySqlNullSafeEqual => {
                Some(Dialector::MySql)
            }
            Operator::PostgresILike
            | Operator::PostgresSimilarTo
            | Operator::PostgresPosixMatch
            | Operator::PostgresPosixIMatch => Some(Dialector::Postgres),
            Operator::SqliteGlob => Some(Dialector::Sqlite),
            _ => None,
        }
    }

    pub fn supports(self, dialector: Dialector) -> bool {
        self.dialector().is_none_or(|only| only == dialector)
    }

    /// Resolve the token to emit for `dialector`.
    ///
    /// MySQL has no `IS [NOT] DISTINCT FROM`; both resolve to the null-safe
    /// equal operator there and [`Operator::negated_on`] tells the compiler
    /// which one needs a leading `NOT`.
    pub fn resolve(self, dialector: Dialector) -> CqlResult<&'static str> {
        if !self.supports(dialector) {
            return Err(CqlError::unsupported(self.name(), dialector));
        }
        match (self, dialector) {
            (Operator::IsDistinct | Operator::IsNotDistinct, Dialector::MySql) => {
                Ok(Operator::MySqlNullSafeEqual.sql())
            }
            _ => Ok(self.sql()),
        }
    }

    /// Whether the resolved comparison must be wrapped as `NOT lhs <op> rhs`.
    pub fn negated_on(self, dialector: Dialector) -> bool {
        self == Operator::IsDistinct && dialector == Dialector::MySql
    }

    /// Number of values the operator compares against.
    pub fn arity(self) -> Arity {
        match self {
            Operator::IsNull | Operator::IsNotNull | Operator::Not => Arity::Exact(0),
            Operator::Between | Operator::NotBetween => Arity::Exact(2),
            Operator::ArrayIn | Operator::ArrayNotIn | Operator::MySqlXor => Arity::AtLeast(1),
            Operator::And | Operator::Or => Arity::AtLeast(0),
            _ => Arity::Exact(1),
        }
    }

    /// Logical operators that combine conditions instead of comparing a field.
    pub fn is_connector(self) -> bool {
        matches!(
            self,
            Operator::And | Operator::Or | Operator::Not | Operator::MySqlXor
        )
    }

    /// Operators usable in a field comparison.
    pub fn is_comparison(self) -> bool {
        !self.is_connector() && self != Operator::Escape
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
