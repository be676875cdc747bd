//! Functions applied to a column before it is compared.
//!
//! Each function resolves to a [`RenderStrategy`] per dialect: the exact
//! dialect entry wins, then the catch-all entry. A function with neither is
//! unsupported on that engine.

use crate::dialect::Dialector;
use crate::error::{CqlError, CqlResult};
use std::fmt;

/// Arithmetic, bitwise and text functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Plus,
    Minus,
    Times,
    Divided,
    Modulo,
    Power,
    SquareRoot,
    Absolute,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    BitShiftLeft,
    BitShiftRight,
    Concat,
}

/// How a function wraps the SQL it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    /// `(lhs OP ?)`
    Infix(&'static str),
    /// `FUNC(lhs, ?, ...)`
    Call(&'static str),
    /// `OPlhs`
    Prefix(&'static str),
}

impl RenderStrategy {
    /// Wrap `inner`, adding one placeholder per value where the strategy takes them.
    pub fn apply(self, inner: &str, values: usize) -> String {
        match self {
            RenderStrategy::Infix(op) => format!("({inner} {op} ?)"),
            RenderStrategy::Call(func) => {
                let placeholders = ", ?".repeat(values);
                format!("{func}({inner}{placeholders})")
            }
            RenderStrategy::Prefix(op) => format!("{op}{inner}"),
        }
    }

    /// Number of parameters the rendered SQL binds for `values` supplied values.
    pub fn placeholders(self, values: usize) -> usize {
        match self {
            RenderStrategy::Infix(_) => 1,
            RenderStrategy::Call(_) => values,
            RenderStrategy::Prefix(_) => 0,
        }
    }
}

impl Function {
    pub const ALL: &'static [Function] = &[
        Function::Plus,
        Function::Minus,
        Function::Times,
        Function::Divided,
        Function::Modulo,
        Function::Power,
        Function::SquareRoot,
        Function::Absolute,
        Function::BitAnd,
        Function::BitOr,
        Function::BitXor,
        Function::BitNot,
        Function::BitShiftLeft,
        Function::BitShiftRight,
        Function::Concat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::Plus => "Plus",
            Function::Minus => "Minus",
            Function::Times => "Times",
            Function::Divided => "Divided",
            Function::Modulo => "Modulo",
            Function::Power => "Power",
            Function::SquareRoot => "SquareRoot",
            Function::Absolute => "Absolute",
            Function::BitAnd => "BitAnd",
            Function::BitOr => "BitOr",
            Function::BitXor => "BitXor",
            Function::BitNot => "BitNot",
            Function::BitShiftLeft => "BitShiftLeft",
            Function::BitShiftRight => "BitShiftRight",
            Function::Concat => "Concat",
        }
    }

    /// Number of values the function takes.
    pub fn arity(self) -> usize {
        match self {
            Function::SquareRoot | Function::Absolute | Function::BitNot => 0,
            _ => 1,
        }
    }

    /// Dialect-specific entry, if any.
    fn exact(self, dialector: Dialector) -> Option<RenderStrategy> {
        use RenderStrategy::*;

        match (self, dialector) {
            (Function::Power, Dialector::Postgres) => Some(Infix("^")),
            (Function::SquareRoot, Dialector::Postgres) => Some(Prefix("|/")),
            (Function::Absolute, Dialector::Postgres) => Some(Prefix("@")),
            (Function::BitXor, Dialector::Postgres) => Some(Infix("#")),
            (Function::BitXor, Dialector::MySql | Dialector::SqlServer) => Some(Infix("^")),
            (Function::Concat, Dialector::Postgres) => Some(Infix("||")),
            _ => None,
        }
    }

    /// Catch-all entry used when no dialect-specific one exists.
    fn fallback(self) -> Option<RenderStrategy> {
        use RenderStrategy::*;

        match self {
            Function::Plus => Some(Infix("+")),
            Function::Minus => Some(Infix("-")),
            Function::Times => Some(Infix("*")),
            Function::Divided => Some(Infix("/")),
            Function::Modulo => Some(Infix("%")),
            Function::Power => Some(Call("POWER")),
            Function::SquareRoot => Some(Call("SQRT")),
            Function::Absolute => Some(Call("abs")),
            Function::BitAnd => Some(Infix("&")),
            Function::BitOr => Some(Infix("|")),
            Function::BitXor => None,
            Function::BitNot => Some(Prefix("~")),
            Function::BitShiftLeft => Some(Infix("<<")),
            Function::BitShiftRight => Some(Infix(">>")),
            Function::Concat => Some(Call("CONCAT")),
        }
    }

    pub fn resolve(self, dialector: Dialector) -> CqlResult<RenderStrategy> {
        self.exact(dialector)
            .or_else(|| self.fallback())
            .ok_or_else(|| CqlError::unsupported(self.name(), dialector))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
