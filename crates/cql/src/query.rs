//! Statements over a root model.
//!
//! - [`query`]: `SELECT` with joins, preloads, ordering and pagination.
//! - [`update`]: `UPDATE ... SET`.
//! - [`delete`]: `DELETE`, or a soft delete for models with a deleted-at column.
//!
//! Joins of an `UPDATE` or `DELETE` are rendered the way each engine lets a
//! data-modifying statement see other tables:
//!
//! | dialect | `UPDATE` | `DELETE` |
//! |---------|----------|----------|
//! | Postgres | `UPDATE t SET .. FROM j WHERE on AND ..` | `DELETE FROM t USING j WHERE on AND ..` |
//! | SQLite | `UPDATE t SET .. FROM j WHERE on AND ..` | `WHERE t.pk IN (SELECT t.pk FROM t JOIN ..)` |
//! | SQL Server | `UPDATE t SET .. FROM j WHERE on AND ..` | `DELETE t FROM t JOIN ..` |
//! | MySQL | `UPDATE t JOIN .. SET t.c = ..` | `DELETE t FROM t JOIN ..` |
//!
//! Every builder compiles to a [`Statement`]; compiling the same builder twice
//! against the same dialect yields identical SQL and parameters.

use crate::compile::{Compiler, Join, Preload};
use crate::condition::{Condition, ConditionNode};
use crate::dialect::Dialector;
use crate::error::{CqlError, CqlResult};
use crate::field::{Field, FieldRef, Set, SetValue};
use crate::model::{Model, ModelRef};
use crate::sql::{self, Sql};
use crate::value::Value;
use serde::Serialize;
use std::marker::PhantomData;

/// A compiled statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<Value>,
    /// Relations to hydrate after execution.
    pub preloads: Vec<Preload>,
    pub dialector: Dialector,
}

impl Statement {
    fn new(sql: Sql, dialector: Dialector, preloads: Vec<Preload>) -> Self {
        let statement = Self {
            sql: sql.to_sql(),
            params: sql.into_params(),
            preloads,
            dialector,
        };
        tracing::debug!(
            target: "cql.sql",
            dialector = %statement.dialector,
            params = statement.params.len(),
            sql = %statement.sql,
            "compiled statement"
        );
        statement
    }

    /// SQL text with the dialect's native placeholders (`$1`, `@p1`, `?`).
    pub fn native_sql(&self) -> String {
        sql::number_placeholders(&self.sql, self.dialector)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A `SELECT` on model `M`.
pub struct Query<M> {
    conditions: Vec<ConditionNode>,
    order: Vec<(FieldRef, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    _model: PhantomData<fn() -> M>,
}

/// Start a query on model `M`.
pub fn query<M: Model>(conditions: Vec<Condition<M>>) -> Query<M> {
    Query {
        conditions: conditions.into_iter().map(Condition::into_node).collect(),
        order: Vec::new(),
        limit: None,
        offset: None,
        _model: PhantomData,
    }
}

impl<M: Model> Query<M> {
    /// Order by a field of any model joined in the query.
    pub fn ascending(mut self, field: impl Into<FieldRef>) -> Self {
        self.order.push((field.into(), Order::Asc));
        self
    }

    pub fn descending(mut self, field: impl Into<FieldRef>) -> Self {
        self.order.push((field.into(), Order::Desc));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn conditions(&self) -> &[ConditionNode] {
        &self.conditions
    }

    pub fn compile(&self, dialector: Dialector) -> CqlResult<Statement> {
        let mut compiler = Compiler::new(ModelRef::of::<M>(), dialector);
        compiler.plan(&self.conditions)?;
        let filter = compiler.where_clause(&self.conditions)?;

        let mut out = Sql::new(format!("SELECT {}.*", compiler.root.alias));
        for select in &compiler.selects {
            out.push(", ").push(select);
        }
        out.push(" FROM ").push(M::TABLE);
        for join in &compiler.joins {
            out.push(" ").push(&join.clause());
        }
        if !filter.is_empty() {
            out.push(" WHERE ").push_sql(filter);
        }

        if !self.order.is_empty() {
            let mut columns = Vec::with_capacity(self.order.len());
            for (field, order) in &self.order {
                let mut column = compiler.reference(field)?;
                column.push(" ").push(order.sql());
                columns.push(column);
            }
            out.push(" ORDER BY ").push_joined(columns, ", ");
        }
        push_pagination(&mut out, dialector, self.limit, self.offset, !self.order.is_empty());

        Ok(Statement::new(out, dialector, compiler.preloads))
    }
}

fn push_pagination(
    out: &mut Sql,
    dialector: Dialector,
    limit: Option<u64>,
    offset: Option<u64>,
    ordered: bool,
) {
    if limit.is_none() && offset.is_none() {
        return;
    }

    match dialector {
        Dialector::SqlServer => {
            if !ordered {
                out.push(" ORDER BY (SELECT NULL)");
            }
            out.push(&format!(" OFFSET {} ROWS", offset.unwrap_or(0)));
            if let Some(limit) = limit {
                out.push(&format!(" FETCH NEXT {limit} ROWS ONLY"));
            }
        }
        _ => {
            match (limit, dialector) {
                (Some(limit), _) => {
                    out.push(&format!(" LIMIT {limit}"));
                }
                // OFFSET is only valid after a LIMIT on these engines.
                (None, Dialector::MySql) => {
                    out.push(&format!(" LIMIT {}", u64::MAX));
                }
                (None, Dialector::Sqlite) => {
                    out.push(" LIMIT -1");
                }
                (None, _) => {}
            }
            if let Some(offset) = offset {
                out.push(&format!(" OFFSET {offset}"));
            }
        }
    }
}

/// Append `WHERE` with the ON conditions of joins moved out of a JOIN clause
/// followed by the filter.
fn push_where(out: &mut Sql, joins: &[Join], filter: Sql) {
    let mut parts: Vec<Sql> = joins.iter().map(|join| Sql::new(join.on.clone())).collect();
    if !filter.is_empty() {
        parts.push(filter);
    }
    if !parts.is_empty() {
        out.push(" WHERE ").push_joined(parts, " AND ");
    }
}

fn push_join_clauses(out: &mut Sql, joins: &[Join]) {
    for join in joins {
        out.push(" ").push(&join.clause());
    }
}

fn sources(joins: &[Join]) -> String {
    joins.iter().map(Join::source).collect::<Vec<_>>().join(", ")
}

fn update_statement(compiler: &Compiler, joins: &[Join], assignments: Vec<Sql>, filter: Sql) -> Sql {
    let table = compiler.root.model.table;
    if joins.is_empty() {
        let mut out = Sql::new(format!("UPDATE {table} SET "));
        out.push_joined(assignments, ", ");
        push_where(&mut out, &[], filter);
        return out;
    }

    match compiler.dialector {
        Dialector::MySql => {
            let mut out = Sql::new(format!("UPDATE {table}"));
            push_join_clauses(&mut out, joins);
            out.push(" SET ").push_joined(assignments, ", ");
            push_where(&mut out, &[], filter);
            out
        }
        Dialector::Postgres | Dialector::Sqlite | Dialector::SqlServer => {
            let mut out = Sql::new(format!("UPDATE {table} SET "));
            out.push_joined(assignments, ", ");
            out.push(" FROM ").push(&sources(joins));
            push_where(&mut out, joins, filter);
            out
        }
    }
}

fn delete_statement(compiler: &Compiler, joins: &[Join], filter: Sql) -> Sql {
    let table = compiler.root.model.table;
    if joins.is_empty() {
        let mut out = Sql::new(format!("DELETE FROM {table}"));
        push_where(&mut out, &[], filter);
        return out;
    }

    match compiler.dialector {
        Dialector::MySql | Dialector::SqlServer => {
            let mut out = Sql::new(format!("DELETE {table} FROM {table}"));
            push_join_clauses(&mut out, joins);
            push_where(&mut out, &[], filter);
            out
        }
        Dialector::Postgres => {
            let mut out = Sql::new(format!("DELETE FROM {table} USING {}", sources(joins)));
            push_where(&mut out, joins, filter);
            out
        }
        // No join syntax in SQLite's DELETE.
        Dialector::Sqlite => {
            let key = compiler.root.column(compiler.root.model.primary_key);
            let mut out = Sql::new(format!(
                "DELETE FROM {table} WHERE {key} IN (SELECT {key} FROM {table}"
            ));
            push_join_clauses(&mut out, joins);
            push_where(&mut out, &[], filter);
            out.push(")");
            out
        }
    }
}

/// An `UPDATE` of model `M`.
pub struct Update<M> {
    conditions: Vec<ConditionNode>,
    sets: Vec<Set>,
    _model: PhantomData<fn() -> M>,
}

impl<M> std::fmt::Debug for Update<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Update")
            .field("conditions", &self.conditions)
            .field("sets", &self.sets)
            .finish()
    }
}

/// Start an update of the rows of `M` matching `conditions`.
pub fn update<M: Model>(conditions: Vec<Condition<M>>) -> Update<M> {
    Update {
        conditions: conditions.into_iter().map(Condition::into_node).collect(),
        sets: Vec::new(),
        _model: PhantomData,
    }
}

impl<M: Model> Update<M> {
    fn push(mut self, set: Set) -> CqlResult<Self> {
        set.validate()?;
        self.sets.push(set);
        Ok(self)
    }

    /// Set `field` to `value`. Fails for read-only fields.
    pub fn set<T: Into<Value>>(self, field: Field<M, T>, value: impl Into<T>) -> CqlResult<Self> {
        self.push(field.assign(value))
    }

    /// Set `field` to the value of `other`, a field of `M` or of a joined model.
    pub fn set_dynamic<T, N>(self, field: Field<M, T>, other: Field<N, T>) -> CqlResult<Self> {
        self.push(field.assign_dynamic(other))
    }

    /// Set a nullable `field` to `NULL`.
    pub fn set_null<T>(self, field: Field<M, T>) -> CqlResult<Self> {
        self.push(field.assign_null())
    }

    /// Assignments to fields of `M` and of joined models. Assigning a joined
    /// model's field is only supported by MySQL.
    pub fn set_multiple(self, sets: Vec<Set>) -> CqlResult<Self> {
        sets.into_iter().try_fold(self, |update, set| update.push(set))
    }

    pub fn compile(&self, dialector: Dialector) -> CqlResult<Statement> {
        if self.sets.is_empty() {
            return Err(CqlError::malformed(format!(
                "update of {} requires at least one set",
                M::NAME
            )));
        }

        let root = ModelRef::of::<M>();
        let multiple = self.sets.iter().any(|set| !set.field.belongs_to(&root));
        if multiple && dialector != Dialector::MySql {
            return Err(CqlError::UnsupportedOperatorForDialect {
                name: "set_multiple",
                dialector,
            });
        }

        let mut compiler = Compiler::new(root, dialector);
        compiler.plan(&self.conditions)?;
        let filter = compiler.where_clause(&self.conditions)?;
        let joins = std::mem::take(&mut compiler.joins);

        // MySQL names every assigned column once other tables are in scope.
        let qualified = dialector == Dialector::MySql && (multiple || !joins.is_empty());
        let mut assignments = Vec::with_capacity(self.sets.len());
        for set in &self.sets {
            let column = if qualified {
                compiler.target(&set.field)?
            } else {
                set.field.column_name()
            };
            let mut assignment = Sql::new(format!("{column} = "));
            match &set.value {
                SetValue::Value(value) => {
                    assignment.push_bind(value.clone());
                }
                SetValue::Field(other) => {
                    assignment.push_sql(compiler.reference(other)?);
                }
                SetValue::Null => {
                    assignment.push("NULL");
                }
            }
            assignments.push(assignment);
        }

        let out = update_statement(&compiler, &joins, assignments, filter);
        Ok(Statement::new(out, dialector, Vec::new()))
    }
}

/// A `DELETE` of model `M`.
pub struct Delete<M> {
    conditions: Vec<ConditionNode>,
    _model: PhantomData<fn() -> M>,
}

/// Start a delete of the rows of `M` matching `conditions`.
pub fn delete<M: Model>(conditions: Vec<Condition<M>>) -> Delete<M> {
    Delete {
        conditions: conditions.into_iter().map(Condition::into_node).collect(),
        _model: PhantomData,
    }
}

impl<M: Model> Delete<M> {
    /// Compile the delete. Models with a deleted-at column are soft deleted.
    pub fn compile(&self, dialector: Dialector) -> CqlResult<Statement> {
        if self.conditions.is_empty() {
            return Err(CqlError::malformed(format!(
                "delete of {} requires at least one condition",
                M::NAME
            )));
        }

        let mut compiler = Compiler::new(ModelRef::of::<M>(), dialector);
        compiler.plan(&self.conditions)?;
        let filter = compiler.where_clause(&self.conditions)?;
        let joins = std::mem::take(&mut compiler.joins);

        let out = match M::DELETED_AT {
            Some(deleted_at) => {
                let column = if dialector == Dialector::MySql && !joins.is_empty() {
                    compiler.root.column(deleted_at)
                } else {
                    deleted_at.to_string()
                };
                let assignment = Sql::new(format!("{column} = CURRENT_TIMESTAMP"));
                update_statement(&compiler, &joins, vec![assignment], filter)
            }
            None => delete_statement(&compiler, &joins, filter),
        };

        Ok(Statement::new(out, dialector, Vec::new()))
    }
}
