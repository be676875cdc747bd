//! Convenient imports for typical `cql` usage.
//!
//! ```ignore
//! use cql::prelude::*;
//! ```

pub use crate::{
    Condition, CqlError, CqlResult, Dialector, Field, FieldRef, JoinCondition, Model, Operator,
    Relation, Set, Statement, Value, WhereCondition, and, delete, not, or, query, unsafe_condition,
    update, xor,
};
