//! # cql
//!
//! Typed, composable query conditions compiled to dialect-correct SQL.
//!
//! ## Features
//!
//! - **Typed conditions**: comparisons are methods on [`Field<M, T>`] handles, so
//!   a condition on the wrong model or with a value of the wrong type does not
//!   compile
//! - **Dialect aware**: operators and functions resolve per engine (Postgres,
//!   MySQL, SQLite, SQL Server); unsupported ones fail at compile time instead of
//!   at the database
//! - **Joins and preloads**: nested conditions on related models become JOINs,
//!   preloaded models are selected under `"<alias>__<column>"` names
//! - **Collection predicates**: `any`, `none` and `all` over a has-many
//!   relation compile to `EXISTS` subqueries
//! - **Deterministic**: compiling the same tree twice yields byte-identical SQL
//!   and parameters
//! - **Escape hatch**: [`unsafe_condition`] and [`Field::is_unsafe`] bypass
//!   typing when needed
//!
//! ## Example
//!
//! ```ignore
//! use cql::{query, Dialector};
//!
//! let stmt = query::<Company>(vec![
//!     Company::seller(vec![Seller::name().eq("Acme").into()]).into(),
//! ])
//! .compile(Dialector::Postgres)?;
//!
//! // SELECT companies.* FROM companies
//! //   INNER JOIN sellers seller ON seller.company_id = companies.id
//! //   WHERE (seller.name = ?)
//! assert_eq!(stmt.params, vec!["Acme".into()]);
//! ```
//!
//! Cross-model comparisons (`field.is_dynamic().eq(other)`) must reference a
//! model joined in the same query; `cql-lint` checks this at build time.

pub mod compile;
pub mod condition;
pub mod dialect;
pub mod error;
pub mod field;
pub mod function;
pub mod model;
pub mod operator;
pub mod prelude;
pub mod preload;
pub mod query;
pub mod sql;
pub mod value;

pub use compile::Preload;
pub use condition::{
    Condition, ConditionNode, JoinCondition, JoinNode, WhereCondition, and, not, or,
    unsafe_condition, xor,
};
pub use dialect::Dialector;
pub use error::{CqlError, CqlResult};
pub use field::{
    DynamicFieldIs, Field, FieldRef, FunctionCall, IntoOperand, Operand, Relation, Set, SetValue,
    UnsafeFieldIs,
};
pub use function::{Function, RenderStrategy};
pub use model::{Model, ModelRef};
pub use operator::{Arity, Operator};
pub use preload::{Loadable, NullableId};
pub use query::{Delete, Order, Query, Statement, Update, delete, query, update};
pub use sql::Sql;
pub use value::Value;
