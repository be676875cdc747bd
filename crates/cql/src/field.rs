//! Typed field and relation handles.
//!
//! [`Field<M, T>`] is the handle callers invoke comparisons on: `M` is the
//! owning model and `T` the Rust type of the column, so a comparison against a
//! value of the wrong type, or a field of another model in the wrong scope, is
//! rejected by the compiler. [`FieldRef`] is its type-erased form carried
//! inside condition trees.

use crate::condition::{Condition, ConditionNode, JoinCondition, JoinNode, WhereCondition};
use crate::error::{CqlError, CqlResult};
use crate::function::Function;
use crate::model::{Model, ModelRef};
use crate::operator::Operator;
use crate::value::Value;
use chrono::{DateTime, Utc};
use heck::ToSnakeCase;
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A function applied to a column, with its own parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function: Function,
    pub values: Vec<Value>,
}

/// Type-erased reference to a model's field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub model: ModelRef,
    pub name: &'static str,
    pub column: Option<&'static str>,
    pub updatable: bool,
    pub nullable: bool,
    pub functions: Vec<FunctionCall>,
    /// Which join of `model` to use when it is joined more than once.
    pub appearance: Option<usize>,
}

impl FieldRef {
    pub fn new<M: Model>(name: &'static str) -> Self {
        Self {
            model: ModelRef::of::<M>(),
            name,
            column: None,
            updatable: true,
            nullable: false,
            functions: Vec::new(),
            appearance: None,
        }
    }

    /// Column name: the override if any, else the snake_case field name.
    pub fn column_name(&self) -> String {
        match self.column {
            Some(column) => column.to_string(),
            None => self.name.to_snake_case(),
        }
    }

    pub fn belongs_to(&self, model: &ModelRef) -> bool {
        self.model == *model
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model.name, self.name)
    }
}

/// Numeric column types accepted by arithmetic functions.
pub trait Numeric: Into<Value> {}

/// Integer column types accepted by bitwise functions.
pub trait Integer: Numeric {}

macro_rules! impl_numeric {
    ($($ty:ty),*) => { $(impl Numeric for $ty {})* };
}

macro_rules! impl_integer {
    ($($ty:ty),*) => { $(impl Integer for $ty {})* };
}

impl_numeric!(i8, i16, i32, i64, u8, u16, u32, f32, f64);
impl_integer!(i8, i16, i32, i64, u8, u16, u32);

/// A typed handle to field `T` of model `M`.
pub struct Field<M, T> {
    inner: FieldRef,
    _marker: PhantomData<fn() -> (M, T)>,
}

impl<M, T> Clone for Field<M, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M, T> fmt::Debug for Field<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.inner).finish()
    }
}

impl<M, T> From<Field<M, T>> for FieldRef {
    fn from(field: Field<M, T>) -> Self {
        field.inner
    }
}

impl<M: Model, T> Field<M, T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: FieldRef::new::<M>(name),
            _marker: PhantomData,
        }
    }

    /// Override the column name.
    pub fn column(mut self, column: &'static str) -> Self {
        self.inner.column = Some(column);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.inner.nullable = true;
        self
    }

    /// Mark the field as not updatable.
    pub fn read_only(mut self) -> Self {
        self.inner.updatable = false;
        self
    }

    pub fn field_ref(&self) -> &FieldRef {
        &self.inner
    }

    /// Select which join of `M` this field refers to when `M` is joined more
    /// than once in the query (0-based, in join order).
    pub fn appearance(mut self, appearance: usize) -> Self {
        self.inner.appearance = Some(appearance);
        self
    }

    fn apply(mut self, function: Function, values: Vec<Value>) -> Self {
        self.inner.functions.push(FunctionCall { function, values });
        self
    }

    /// Compare against other fields instead of values.
    pub fn is_dynamic(self) -> DynamicFieldIs<M, T> {
        DynamicFieldIs {
            field: self.inner,
            _marker: PhantomData,
        }
    }

    /// Compare against untyped operands. No type checks are made.
    pub fn is_unsafe(self) -> UnsafeFieldIs<M> {
        UnsafeFieldIs {
            field: self.inner,
            _marker: PhantomData,
        }
    }

    pub fn is_null(self) -> WhereCondition<M> {
        self.compare(Operator::IsNull, Vec::new())
    }

    pub fn is_not_null(self) -> WhereCondition<M> {
        self.compare(Operator::IsNotNull, Vec::new())
    }

    fn compare(self, operator: Operator, values: Vec<Value>) -> WhereCondition<M> {
        WhereCondition::from_node(ConditionNode::Field {
            field: self.inner,
            operator,
            values,
            escape: None,
        })
    }

    /// Assign the value of another field, of this or any joined model.
    pub fn assign_dynamic<N>(self, other: Field<N, T>) -> Set {
        Set {
            field: self.inner,
            value: SetValue::Field(other.inner),
        }
    }

    /// Assign `NULL`. Only valid for nullable fields.
    pub fn assign_null(self) -> Set {
        Set {
            field: self.inner,
            value: SetValue::Null,
        }
    }
}

impl<M: Model, T: Into<Value>> Field<M, T> {
    /// Assign a value, for [`Update::set_multiple`](crate::Update::set_multiple).
    pub fn assign(self, value: impl Into<T>) -> Set {
        Set {
            field: self.inner,
            value: SetValue::Value(to_value::<T>(value)),
        }
    }

    pub fn eq(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::Eq, vec![to_value::<T>(value)])
    }

    pub fn ne(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::NotEq, vec![to_value::<T>(value)])
    }

    pub fn lt(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::Lt, vec![to_value::<T>(value)])
    }

    pub fn lt_or_eq(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::LtOrEq, vec![to_value::<T>(value)])
    }

    pub fn gt(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::Gt, vec![to_value::<T>(value)])
    }

    pub fn gt_or_eq(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::GtOrEq, vec![to_value::<T>(value)])
    }

    pub fn between(self, from: impl Into<T>, to: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::Between, vec![to_value::<T>(from), to_value::<T>(to)])
    }

    pub fn not_between(self, from: impl Into<T>, to: impl Into<T>) -> WhereCondition<M> {
        self.compare(
            Operator::NotBetween,
            vec![to_value::<T>(from), to_value::<T>(to)],
        )
    }

    pub fn is_distinct(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::IsDistinct, vec![to_value::<T>(value)])
    }

    pub fn is_not_distinct(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::IsNotDistinct, vec![to_value::<T>(value)])
    }

    /// MySQL `<=>`.
    pub fn null_safe_eq(self, value: impl Into<T>) -> WhereCondition<M> {
        self.compare(Operator::MySqlNullSafeEqual, vec![to_value::<T>(value)])
    }

    pub fn in_list<V: Into<T>>(
        self,
        values: impl IntoIterator<Item = V>,
    ) -> CqlResult<WhereCondition<M>> {
        let values: Vec<T> = values.into_iter().map(Into::into).collect();
        self.is(Operator::ArrayIn, values)
    }

    pub fn not_in<V: Into<T>>(
        self,
        values: impl IntoIterator<Item = V>,
    ) -> CqlResult<WhereCondition<M>> {
        let values: Vec<T> = values.into_iter().map(Into::into).collect();
        self.is(Operator::ArrayNotIn, values)
    }

    /// Compare with any comparison operator, checking its arity.
    pub fn is(self, operator: Operator, values: Vec<T>) -> CqlResult<WhereCondition<M>> {
        check_operator(operator, values.len())?;
        Ok(self.compare(operator, values.into_iter().map(Into::into).collect()))
    }
}

impl<M: Model> Field<M, String> {
    pub fn like(self, pattern: impl Into<String>) -> WhereCondition<M> {
        self.compare(Operator::Like, vec![Value::Text(pattern.into())])
    }

    pub fn like_escape(self, pattern: impl Into<String>, escape: char) -> WhereCondition<M> {
        WhereCondition::from_node(ConditionNode::Field {
            field: self.inner,
            operator: Operator::Like,
            values: vec![Value::Text(pattern.into())],
            escape: Some(Value::Text(escape.to_string())),
        })
    }

    /// PostgreSQL `ILIKE`.
    pub fn ilike(self, pattern: impl Into<String>) -> WhereCondition<M> {
        self.compare(Operator::PostgresILike, vec![Value::Text(pattern.into())])
    }

    /// PostgreSQL `SIMILAR TO`.
    pub fn similar_to(self, pattern: impl Into<String>) -> WhereCondition<M> {
        self.compare(Operator::PostgresSimilarTo, vec![Value::Text(pattern.into())])
    }

    /// PostgreSQL `~`.
    pub fn posix_match(self, pattern: impl Into<String>) -> WhereCondition<M> {
        self.compare(Operator::PostgresPosixMatch, vec![Value::Text(pattern.into())])
    }

    /// PostgreSQL `~*`.
    pub fn posix_imatch(self, pattern: impl Into<String>) -> WhereCondition<M> {
        self.compare(
            Operator::PostgresPosixIMatch,
            vec![Value::Text(pattern.into())],
        )
    }

    /// MySQL `REGEXP`.
    pub fn regexp(self, pattern: impl Into<String>) -> WhereCondition<M> {
        self.compare(Operator::MySqlRegexp, vec![Value::Text(pattern.into())])
    }

    /// SQLite `GLOB`.
    pub fn glob(self, pattern: impl Into<String>) -> WhereCondition<M> {
        self.compare(Operator::SqliteGlob, vec![Value::Text(pattern.into())])
    }

    pub fn concat(self, value: impl Into<Value>) -> Self {
        self.apply(Function::Concat, vec![value.into()])
    }
}

impl<M: Model, T: Numeric> Field<M, T> {
    pub fn plus(self, value: impl Into<T>) -> Self {
        self.apply(Function::Plus, vec![to_value::<T>(value)])
    }

    pub fn minus(self, value: impl Into<T>) -> Self {
        self.apply(Function::Minus, vec![to_value::<T>(value)])
    }

    pub fn times(self, value: impl Into<T>) -> Self {
        self.apply(Function::Times, vec![to_value::<T>(value)])
    }

    pub fn divided(self, value: impl Into<T>) -> Self {
        self.apply(Function::Divided, vec![to_value::<T>(value)])
    }

    pub fn modulo(self, value: impl Into<T>) -> Self {
        self.apply(Function::Modulo, vec![to_value::<T>(value)])
    }

    pub fn power(self, value: impl Into<T>) -> Self {
        self.apply(Function::Power, vec![to_value::<T>(value)])
    }

    pub fn square_root(self) -> Self {
        self.apply(Function::SquareRoot, Vec::new())
    }

    pub fn absolute(self) -> Self {
        self.apply(Function::Absolute, Vec::new())
    }
}

impl<M: Model, T: Integer> Field<M, T> {
    pub fn bit_and(self, value: impl Into<T>) -> Self {
        self.apply(Function::BitAnd, vec![to_value::<T>(value)])
    }

    pub fn bit_or(self, value: impl Into<T>) -> Self {
        self.apply(Function::BitOr, vec![to_value::<T>(value)])
    }

    pub fn bit_xor(self, value: impl Into<T>) -> Self {
        self.apply(Function::BitXor, vec![to_value::<T>(value)])
    }

    pub fn bit_not(self) -> Self {
        self.apply(Function::BitNot, Vec::new())
    }

    pub fn shift_left(self, value: impl Into<T>) -> Self {
        self.apply(Function::BitShiftLeft, vec![to_value::<T>(value)])
    }

    pub fn shift_right(self, value: impl Into<T>) -> Self {
        self.apply(Function::BitShiftRight, vec![to_value::<T>(value)])
    }
}

fn to_value<T: Into<Value>>(value: impl Into<T>) -> Value {
    let value: T = value.into();
    value.into()
}

fn check_operator(operator: Operator, values: usize) -> CqlResult<()> {
    if !operator.is_comparison() {
        return Err(CqlError::malformed(format!(
            "{} cannot compare a field",
            operator.name()
        )));
    }
    let arity = operator.arity();
    if !arity.accepts(values) {
        return Err(CqlError::malformed(format!(
            "{} takes {arity} values, got {values}",
            operator.name()
        )));
    }
    Ok(())
}

/// Comparisons of a field against other fields.
///
/// Any model may be referenced on the right-hand side; it must be joined in
/// the same query, which `cql-lint` verifies at build time.
pub struct DynamicFieldIs<M, T> {
    field: FieldRef,
    _marker: PhantomData<fn() -> (M, T)>,
}

impl<M: Model, T> DynamicFieldIs<M, T> {
    fn compare(self, operator: Operator, others: Vec<FieldRef>) -> WhereCondition<M> {
        WhereCondition::from_node(ConditionNode::DynamicField {
            field: self.field,
            operator,
            operands: others.into_iter().map(Operand::Field).collect(),
        })
    }

    pub fn eq<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::Eq, vec![other.into()])
    }

    pub fn ne<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::NotEq, vec![other.into()])
    }

    pub fn lt<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::Lt, vec![other.into()])
    }

    pub fn lt_or_eq<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::LtOrEq, vec![other.into()])
    }

    pub fn gt<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::Gt, vec![other.into()])
    }

    pub fn gt_or_eq<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::GtOrEq, vec![other.into()])
    }

    pub fn is_distinct<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::IsDistinct, vec![other.into()])
    }

    pub fn is_not_distinct<N>(self, other: Field<N, T>) -> WhereCondition<M> {
        self.compare(Operator::IsNotDistinct, vec![other.into()])
    }

    pub fn between<N1, N2>(self, from: Field<N1, T>, to: Field<N2, T>) -> WhereCondition<M> {
        self.compare(Operator::Between, vec![from.into(), to.into()])
    }

    pub fn not_between<N1, N2>(self, from: Field<N1, T>, to: Field<N2, T>) -> WhereCondition<M> {
        self.compare(Operator::NotBetween, vec![from.into(), to.into()])
    }

    pub fn is(self, operator: Operator, others: Vec<FieldRef>) -> CqlResult<WhereCondition<M>> {
        check_operator(operator, others.len())?;
        Ok(self.compare(operator, others))
    }
}

impl<M: Model> DynamicFieldIs<M, String> {
    pub fn like<N>(self, other: Field<N, String>) -> WhereCondition<M> {
        self.compare(Operator::Like, vec![other.into()])
    }
}

/// Right-hand side of an unsafe comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Field(FieldRef),
}

pub trait IntoOperand {
    fn into_operand(self) -> Operand;
}

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

impl IntoOperand for FieldRef {
    fn into_operand(self) -> Operand {
        Operand::Field(self)
    }
}

impl<M, T> IntoOperand for Field<M, T> {
    fn into_operand(self) -> Operand {
        Operand::Field(self.inner)
    }
}

macro_rules! impl_value_operand {
    ($($ty:ty),*) => {
        $(
            impl IntoOperand for $ty {
                fn into_operand(self) -> Operand {
                    Operand::Value(self.into())
                }
            }
        )*
    };
}

impl_value_operand!(
    Value, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String, Uuid, DateTime<Utc>
);

/// Comparisons against untyped operands, values or fields of any type.
pub struct UnsafeFieldIs<M> {
    field: FieldRef,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Model> UnsafeFieldIs<M> {
    pub fn is(self, operator: Operator, operands: Vec<Operand>) -> CqlResult<WhereCondition<M>> {
        check_operator(operator, operands.len())?;
        Ok(self.build(operator, operands))
    }

    fn build(self, operator: Operator, operands: Vec<Operand>) -> WhereCondition<M> {
        if operands.iter().any(|o| matches!(o, Operand::Field(_))) {
            return WhereCondition::from_node(ConditionNode::DynamicField {
                field: self.field,
                operator,
                operands,
            });
        }
        let values = operands
            .into_iter()
            .filter_map(|o| match o {
                Operand::Value(v) => Some(v),
                Operand::Field(_) => None,
            })
            .collect();
        WhereCondition::from_node(ConditionNode::Field {
            field: self.field,
            operator,
            values,
            escape: None,
        })
    }

    pub fn eq(self, operand: impl IntoOperand) -> WhereCondition<M> {
        self.build(Operator::Eq, vec![operand.into_operand()])
    }

    pub fn ne(self, operand: impl IntoOperand) -> WhereCondition<M> {
        self.build(Operator::NotEq, vec![operand.into_operand()])
    }

    pub fn lt(self, operand: impl IntoOperand) -> WhereCondition<M> {
        self.build(Operator::Lt, vec![operand.into_operand()])
    }

    pub fn lt_or_eq(self, operand: impl IntoOperand) -> WhereCondition<M> {
        self.build(Operator::LtOrEq, vec![operand.into_operand()])
    }

    pub fn gt(self, operand: impl IntoOperand) -> WhereCondition<M> {
        self.build(Operator::Gt, vec![operand.into_operand()])
    }

    pub fn gt_or_eq(self, operand: impl IntoOperand) -> WhereCondition<M> {
        self.build(Operator::GtOrEq, vec![operand.into_operand()])
    }

    pub fn between(self, from: impl IntoOperand, to: impl IntoOperand) -> WhereCondition<M> {
        self.build(
            Operator::Between,
            vec![from.into_operand(), to.into_operand()],
        )
    }
}

/// Right-hand side of an `UPDATE` assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Value(Value),
    Field(FieldRef),
    Null,
}

/// One assignment of an `UPDATE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub field: FieldRef,
    pub value: SetValue,
}

impl Set {
    pub(crate) fn validate(&self) -> CqlResult<()> {
        if !self.field.updatable {
            return Err(CqlError::malformed(format!("{} is not updatable", self.field)));
        }
        if matches!(self.value, SetValue::Null) && !self.field.nullable {
            return Err(CqlError::malformed(format!("{} is not nullable", self.field)));
        }
        Ok(())
    }
}

/// A relation from model `M` to model `T`, joined on
/// `T.foreign_column = M.local_column`.
pub struct Relation<M, T> {
    name: &'static str,
    local_column: &'static str,
    foreign_column: &'static str,
    _marker: PhantomData<fn() -> (M, T)>,
}

impl<M: Model, T: Model> Relation<M, T> {
    pub fn new(
        name: &'static str,
        local_column: &'static str,
        foreign_column: &'static str,
    ) -> Self {
        Self {
            name,
            local_column,
            foreign_column,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Join `T`, filtering it with `conditions`.
    pub fn join(self, conditions: Vec<Condition<T>>) -> JoinCondition<M> {
        JoinCondition::from_join(JoinNode {
            target: ModelRef::of::<T>(),
            relation: self.name,
            local_column: self.local_column,
            foreign_column: self.foreign_column,
            conditions: conditions.into_iter().map(Condition::into_node).collect(),
            preload: false,
        })
    }

    fn exists(&self, conditions: Vec<ConditionNode>) -> ConditionNode {
        ConditionNode::Exists(JoinNode {
            target: ModelRef::of::<T>(),
            relation: self.name,
            local_column: self.local_column,
            foreign_column: self.foreign_column,
            conditions,
            preload: false,
        })
    }

    fn collection_conditions(
        &self,
        predicate: &str,
        conditions: Vec<WhereCondition<T>>,
    ) -> CqlResult<Vec<ConditionNode>> {
        if conditions.is_empty() {
            return Err(CqlError::malformed(format!(
                "{predicate} over {}.{} requires at least one condition",
                M::NAME,
                self.name
            )));
        }
        Ok(conditions.into_iter().map(WhereCondition::into_node).collect())
    }

    /// At least one related `T` satisfies every condition.
    pub fn any(self, conditions: Vec<WhereCondition<T>>) -> CqlResult<WhereCondition<M>> {
        let conditions = self.collection_conditions("any", conditions)?;
        Ok(WhereCondition::from_node(self.exists(conditions)))
    }

    /// No related `T` satisfies every condition.
    pub fn none(self, conditions: Vec<WhereCondition<T>>) -> CqlResult<WhereCondition<M>> {
        let conditions = self.collection_conditions("none", conditions)?;
        Ok(WhereCondition::from_node(ConditionNode::Connector {
            operator: Operator::Not,
            conditions: vec![self.exists(conditions)],
        }))
    }

    /// Every related `T` satisfies the conditions. True when there are none.
    pub fn all(self, conditions: Vec<WhereCondition<T>>) -> CqlResult<WhereCondition<M>> {
        let conditions = self.collection_conditions("all", conditions)?;
        let counterexample = ConditionNode::Connector {
            operator: Operator::Not,
            conditions,
        };
        Ok(WhereCondition::from_node(ConditionNode::Connector {
            operator: Operator::Not,
            conditions: vec![self.exists(vec![counterexample])],
        }))
    }

    /// Preload a collection of `T` (a has-many relation), optionally with
    /// nested preloads. Nested joins may only preload, never filter.
    pub fn preload_collection(self, nested: Vec<JoinCondition<T>>) -> CqlResult<Condition<M>> {
        let nested: Vec<JoinNode> = nested.into_iter().map(JoinCondition::into_join).collect();
        if let Some(bad) = nested
            .iter()
            .find(|j| !j.makes_preload() || j.makes_filter())
        {
            return Err(CqlError::malformed(format!(
                "only preloads are allowed in the collection {}.{}; {} filters or does not preload",
                M::NAME,
                self.name,
                bad.relation
            )));
        }
        Ok(Condition::from_node(ConditionNode::Collection {
            relation: self.name,
            target: ModelRef::of::<T>(),
            nested,
        }))
    }
}
