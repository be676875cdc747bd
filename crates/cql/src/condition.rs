//! Condition trees.
//!
//! Every node kind lives in the closed [`ConditionNode`] enum; the compiler is
//! a single routine matching on it. The typed wrappers carry the model a
//! condition applies to:
//!
//! - [`WhereCondition<M>`]: a predicate (field comparison, connector,
//!   collection predicate, unsafe fragment). Only these can be combined with
//!   [`and`], [`or`], [`not`] and [`xor`].
//! - [`JoinCondition<M>`]: a join from `M` to a related model.
//! - [`Condition<M>`]: anything a query on `M` accepts.
//!
//! # Example
//! ```ignore
//! use cql::{and, or, query, Dialector};
//!
//! let stmt = query::<Company>(vec![
//!     Company::sellers().any(vec![Seller::name().eq("Acme")])?.into(),
//!     or(vec![Company::name().eq("a"), Company::name().eq("b")]).into(),
//! ])
//! .compile(Dialector::Postgres)?;
//! ```

use crate::compile;
use crate::dialect::Dialector;
use crate::error::{CqlError, CqlResult};
use crate::field::{FieldRef, Operand};
use crate::model::{Model, ModelRef};
use crate::operator::Operator;
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;

/// A node of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// `field <op> values`.
    Field {
        field: FieldRef,
        operator: Operator,
        values: Vec<Value>,
        escape: Option<Value>,
    },
    /// `field <op> other fields`, possibly of other models.
    DynamicField {
        field: FieldRef,
        operator: Operator,
        operands: Vec<Operand>,
    },
    /// Logical combination of predicates.
    Connector {
        operator: Operator,
        conditions: Vec<ConditionNode>,
    },
    Join(JoinNode),
    /// Fields to hydrate alongside the query. No predicate.
    Preload { model: ModelRef, fields: Vec<FieldRef> },
    /// `EXISTS` over a has-many relation, filtered by the join's conditions.
    Exists(JoinNode),
    /// A has-many collection to hydrate in a follow-up query.
    Collection {
        relation: &'static str,
        target: ModelRef,
        nested: Vec<JoinNode>,
    },
    /// Raw SQL. `{table}` is replaced by the alias of the current table.
    Unsafe { sql: String, values: Vec<Value> },
}

impl ConditionNode {
    /// Whether the node contributes a predicate.
    pub fn is_where(&self) -> bool {
        matches!(
            self,
            ConditionNode::Field { .. }
                | ConditionNode::DynamicField { .. }
                | ConditionNode::Connector { .. }
                | ConditionNode::Exists(_)
                | ConditionNode::Unsafe { .. }
        )
    }

    /// Whether a predicate compares `column` of the scope's own model.
    pub(crate) fn affects_column(&self, column: &str) -> bool {
        match self {
            ConditionNode::Field { field, .. } | ConditionNode::DynamicField { field, .. } => {
                field.column_name() == column
            }
            ConditionNode::Connector { conditions, .. } => {
                conditions.iter().any(|c| c.affects_column(column))
            }
            _ => false,
        }
    }
}

/// A join from a model to a related model.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
    pub target: ModelRef,
    pub relation: &'static str,
    /// Column of the parent table.
    pub local_column: &'static str,
    /// Column of the joined table.
    pub foreign_column: &'static str,
    pub conditions: Vec<ConditionNode>,
    pub preload: bool,
}

impl JoinNode {
    /// Whether this join or any nested one hydrates its model.
    pub fn makes_preload(&self) -> bool {
        self.preload
            || self.conditions.iter().any(|c| match c {
                ConditionNode::Preload { .. } => true,
                ConditionNode::Join(join) => join.makes_preload(),
                _ => false,
            })
    }

    /// Whether this join or any nested one filters.
    pub fn makes_filter(&self) -> bool {
        self.conditions.iter().any(|c| match c {
            ConditionNode::Join(join) => join.makes_filter(),
            other => other.is_where(),
        })
    }

    /// Whether this join itself carries predicates.
    pub fn has_where(&self) -> bool {
        self.conditions.iter().any(ConditionNode::is_where)
    }
}

macro_rules! typed_condition {
    ($name:ident) => {
        impl<M> Clone for $name<M> {
            fn clone(&self) -> Self {
                Self {
                    node: self.node.clone(),
                    _model: PhantomData,
                }
            }
        }

        impl<M> fmt::Debug for $name<M> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.node).finish()
            }
        }

        impl<M> PartialEq for $name<M> {
            fn eq(&self, other: &Self) -> bool {
                self.node == other.node
            }
        }

        impl<M: Model> $name<M> {
            pub(crate) fn from_node(node: ConditionNode) -> Self {
                Self {
                    node,
                    _model: PhantomData,
                }
            }

            pub fn node(&self) -> &ConditionNode {
                &self.node
            }

            pub fn into_node(self) -> ConditionNode {
                self.node
            }

            /// Compile the predicate this condition contributes to a query on
            /// `M`, without the `WHERE` keyword.
            pub fn to_sql(&self, dialector: Dialector) -> CqlResult<(String, Vec<Value>)> {
                let sql = compile::compile_where(
                    ModelRef::of::<M>(),
                    std::slice::from_ref(&self.node),
                    dialector,
                )?;
                Ok((sql.to_sql(), sql.into_params()))
            }
        }
    };
}

/// A predicate over model `M`.
pub struct WhereCondition<M> {
    node: ConditionNode,
    _model: PhantomData<fn() -> M>,
}

/// Any condition accepted by a query on model `M`.
pub struct Condition<M> {
    node: ConditionNode,
    _model: PhantomData<fn() -> M>,
}

typed_condition!(WhereCondition);
typed_condition!(Condition);

impl<M: Model> Condition<M> {
    /// Preload every field of `M`.
    pub fn preload() -> Self {
        Self::from_node(ConditionNode::Preload {
            model: ModelRef::of::<M>(),
            fields: M::fields(),
        })
    }

    /// Preload a subset of the fields of `M`.
    pub fn preload_fields(fields: Vec<FieldRef>) -> CqlResult<Self> {
        let model = ModelRef::of::<M>();
        if let Some(foreign) = fields.iter().find(|f| !f.belongs_to(&model)) {
            return Err(CqlError::malformed(format!(
                "cannot preload {foreign} in a condition on {model}"
            )));
        }
        Ok(Self::from_node(ConditionNode::Preload { model, fields }))
    }
}

impl<M: Model> From<WhereCondition<M>> for Condition<M> {
    fn from(condition: WhereCondition<M>) -> Self {
        Condition::from_node(condition.node)
    }
}

/// A join from model `M` to one of its relations.
pub struct JoinCondition<M> {
    join: JoinNode,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for JoinCondition<M> {
    fn clone(&self) -> Self {
        Self {
            join: self.join.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for JoinCondition<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JoinCondition").field(&self.join).finish()
    }
}

impl<M: Model> JoinCondition<M> {
    pub(crate) fn from_join(join: JoinNode) -> Self {
        Self {
            join,
            _model: PhantomData,
        }
    }

    /// Also hydrate the joined model.
    pub fn preload(mut self) -> Self {
        self.join.preload = true;
        self
    }

    pub fn join(&self) -> &JoinNode {
        &self.join
    }

    pub fn into_join(self) -> JoinNode {
        self.join
    }
}

impl<M: Model> From<JoinCondition<M>> for Condition<M> {
    fn from(condition: JoinCondition<M>) -> Self {
        Condition::from_node(ConditionNode::Join(condition.join))
    }
}

fn connector<M: Model>(operator: Operator, conditions: Vec<WhereCondition<M>>) -> WhereCondition<M> {
    WhereCondition::from_node(ConditionNode::Connector {
        operator,
        conditions: conditions.into_iter().map(WhereCondition::into_node).collect(),
    })
}

/// All conditions hold. An empty list contributes nothing.
pub fn and<M: Model>(conditions: Vec<WhereCondition<M>>) -> WhereCondition<M> {
    connector(Operator::And, conditions)
}

/// At least one condition holds. An empty list contributes nothing.
pub fn or<M: Model>(conditions: Vec<WhereCondition<M>>) -> WhereCondition<M> {
    connector(Operator::Or, conditions)
}

/// None of the conditions hold together: `NOT (a AND b ...)`.
pub fn not<M: Model>(conditions: Vec<WhereCondition<M>>) -> CqlResult<WhereCondition<M>> {
    if conditions.is_empty() {
        return Err(CqlError::malformed(format!(
            "{} requires at least one condition",
            Operator::Not.name()
        )));
    }
    Ok(connector(Operator::Not, conditions))
}

/// MySQL `XOR` of one or more conditions.
pub fn xor<M: Model>(
    first: WhereCondition<M>,
    rest: Vec<WhereCondition<M>>,
) -> WhereCondition<M> {
    let mut conditions = Vec::with_capacity(rest.len() + 1);
    conditions.push(first);
    conditions.extend(rest);
    connector(Operator::MySqlXor, conditions)
}

/// Raw SQL predicate on model `M`.
///
/// `{table}` in `sql` is replaced by the alias of the table the condition is
/// applied to; `?` placeholders bind `values` in order. Nothing else is
/// checked: the caller is responsible for injection safety.
pub fn unsafe_condition<M: Model>(sql: impl Into<String>, values: Vec<Value>) -> WhereCondition<M> {
    WhereCondition::from_node(ConditionNode::Unsafe {
        sql: sql.into(),
        values,
    })
}
