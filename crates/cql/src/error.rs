//! Error types for cql

use crate::dialect::Dialector;
use thiserror::Error;

/// Result type alias for cql operations
pub type CqlResult<T> = Result<T, CqlError>;

/// Errors raised while building, compiling or verifying queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CqlError {
    /// An operator or function has no rendering for the target dialect.
    #[error("{name} is not supported by {dialector}")]
    UnsupportedOperatorForDialect {
        name: &'static str,
        dialector: Dialector,
    },

    /// The condition tree was built with invalid arguments.
    #[error("Malformed condition tree: {0}")]
    MalformedConditionTree(String),

    /// A field's model is joined more than once and no appearance was selected.
    #[error("{model} is joined {joins} times in the query; select one with appearance()")]
    AmbiguousModelReference { model: &'static str, joins: usize },

    /// The selected appearance is past the number of joins of the model.
    #[error("appearance {appearance} of {model} selected but it is joined {joins} times")]
    AppearanceOutOfRange {
        model: &'static str,
        appearance: usize,
        joins: usize,
    },

    /// A relation was read without having been loaded by the query.
    #[error("Relation not loaded: {model}")]
    RelationNotLoaded { model: &'static str },

    /// A dialect name that does not match any supported engine.
    #[error("Unknown dialector: {0}")]
    UnknownDialector(String),
}

impl CqlError {
    /// Create an unsupported operator/function error
    pub fn unsupported(name: &'static str, dialector: Dialector) -> Self {
        Self::UnsupportedOperatorForDialect { name, dialector }
    }

    /// Create a malformed condition tree error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedConditionTree(message.into())
    }

    /// Create a relation not loaded error for the related type `T`
    pub fn not_loaded<T: ?Sized>() -> Self {
        Self::RelationNotLoaded {
            model: short_type_name::<T>(),
        }
    }

    /// Check if this is an unsupported dialect error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperatorForDialect { .. })
    }

    /// Check if this is a relation not loaded error
    pub fn is_not_loaded(&self) -> bool {
        matches!(self, Self::RelationNotLoaded { .. })
    }
}

/// Last path segment of a type name: `app::models::Company` -> `Company`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
