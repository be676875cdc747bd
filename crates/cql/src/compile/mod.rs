//! Condition tree compiler.
//!
//! Compilation runs in two passes over the tree:
//!
//! 1. [`Compiler::plan`] walks every join, assigning table aliases and
//!    collecting JOIN clauses and preloads. A join anywhere in the tree makes
//!    its table visible to the whole statement, as it is in SQL.
//! 2. [`Compiler::where_clause`] renders the predicates of every scope,
//!    resolving field references against the tables registered by the plan.
//!
//! Table aliases: the root table keeps its name, a first-level join is
//! aliased by its relation name and deeper joins by
//! `<parent alias>__<relation>`. Collection predicates (`EXISTS`) alias their
//! table the same way, inside their own subquery.

use crate::condition::{ConditionNode, JoinNode};
use crate::dialect::Dialector;
use crate::error::{CqlError, CqlResult};
use crate::field::{FieldRef, Operand};
use crate::model::ModelRef;
use crate::operator::Operator;
use crate::sql::Sql;
use crate::value::Value;
use heck::ToSnakeCase;
use serde::Serialize;

/// A relation the execution layer must hydrate after running the statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preload {
    /// Columns selected in the statement as `"<alias>__<column>"`.
    Joined {
        model: &'static str,
        alias: String,
        columns: Vec<String>,
    },
    /// A has-many collection, loaded in a follow-up query.
    Collection { model: &'static str, path: String },
}

/// A table taking part in the statement.
#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub model: ModelRef,
    pub alias: String,
    pub initial: bool,
}

impl Table {
    fn root(model: ModelRef) -> Self {
        Self {
            model,
            alias: model.table.to_string(),
            initial: true,
        }
    }

    /// The table reached by following `join` from this one.
    fn deliver(&self, join: &JoinNode) -> Self {
        let relation = join.relation.to_snake_case();
        let alias = if self.initial {
            relation
        } else {
            format!("{}__{}", self.alias, relation)
        };
        Self {
            model: join.target,
            alias,
            initial: false,
        }
    }

    pub fn column(&self, column: &str) -> String {
        format!("{}.{}", self.alias, column)
    }
}

/// A JOIN of the statement. The ON condition never binds parameters.
#[derive(Debug, Clone)]
pub(crate) struct Join {
    pub kind: &'static str,
    pub table: &'static str,
    pub alias: String,
    pub on: String,
}

impl Join {
    /// `<KIND> <table> <alias> ON <on>`.
    pub fn clause(&self) -> String {
        format!("{} {} {} ON {}", self.kind, self.table, self.alias, self.on)
    }

    /// `<table> <alias>`, for `FROM` and `USING` lists.
    pub fn source(&self) -> String {
        format!("{} {}", self.table, self.alias)
    }
}

fn child_path(path: &str, relation: &str) -> String {
    if path.is_empty() {
        relation.to_string()
    } else {
        format!("{path}.{relation}")
    }
}

fn bind(value: &Value) -> Sql {
    let mut sql = Sql::empty();
    sql.push_bind(value.clone());
    sql
}

pub(crate) struct Compiler {
    pub dialector: Dialector,
    pub root: Table,
    pub tables: Vec<Table>,
    pub joins: Vec<Join>,
    pub selects: Vec<String>,
    pub preloads: Vec<Preload>,
}

impl Compiler {
    pub fn new(root: ModelRef, dialector: Dialector) -> Self {
        let root = Table::root(root);
        Self {
            dialector,
            tables: vec![root.clone()],
            root,
            joins: Vec::new(),
            selects: Vec::new(),
            preloads: Vec::new(),
        }
    }

    // ==================== Pass 1: joins and preloads ====================

    pub fn plan(&mut self, nodes: &[ConditionNode]) -> CqlResult<()> {
        let root = self.root.clone();
        self.plan_scope(nodes, &root, "")
    }

    fn plan_scope(&mut self, nodes: &[ConditionNode], parent: &Table, path: &str) -> CqlResult<()> {
        for node in nodes {
            match node {
                ConditionNode::Join(join) => self.plan_join(join, parent, path)?,
                ConditionNode::Collection {
                    relation,
                    target,
                    nested,
                } => self.plan_collection(relation, target, nested, path),
                _ => {}
            }
        }
        Ok(())
    }

    fn plan_join(&mut self, join: &JoinNode, parent: &Table, path: &str) -> CqlResult<()> {
        let table = parent.deliver(join);
        let makes_preload = join.makes_preload();
        let kind = if makes_preload && !join.has_where() {
            "LEFT JOIN"
        } else {
            "INNER JOIN"
        };

        let mut on = format!(
            "{} = {}",
            table.column(join.foreign_column),
            parent.column(join.local_column),
        );
        if let Some(deleted_at) = join.target.deleted_at
            && !join.conditions.iter().any(|c| c.affects_column(deleted_at))
        {
            on.push_str(&format!(" AND {} IS NULL", table.column(deleted_at)));
        }
        self.joins.push(Join {
            kind,
            table: join.target.table,
            alias: table.alias.clone(),
            on,
        });
        self.tables.push(table.clone());

        // Nested models can only be hydrated through their parent.
        if makes_preload && !parent.initial {
            self.preload_table(parent, parent.model.fields());
        }
        if join.preload {
            self.preload_table(&table, join.target.fields());
        }
        for node in &join.conditions {
            if let ConditionNode::Preload { fields, .. } = node {
                self.preload_table(&table, fields.clone());
            }
        }

        self.plan_scope(&join.conditions, &table, &child_path(path, join.relation))
    }

    fn plan_collection(
        &mut self,
        relation: &str,
        target: &ModelRef,
        nested: &[JoinNode],
        path: &str,
    ) {
        let path = child_path(path, relation);
        self.preloads.push(Preload::Collection {
            model: target.name,
            path: path.clone(),
        });
        for join in nested {
            self.plan_collection(join.relation, &join.target, &nested_joins(join), &path);
        }
    }

    fn preload_table(&mut self, table: &Table, fields: Vec<FieldRef>) {
        let columns: Vec<String> = fields.iter().map(FieldRef::column_name).collect();
        let existing = self.preloads.iter_mut().find_map(|p| match p {
            Preload::Joined { alias, columns, .. } if *alias == table.alias => Some(columns),
            _ => None,
        });
        let new_columns: Vec<String> = match existing {
            Some(known) => {
                let fresh: Vec<String> = columns
                    .into_iter()
                    .filter(|c| !known.contains(c))
                    .collect();
                known.extend(fresh.iter().cloned());
                fresh
            }
            None => {
                self.preloads.push(Preload::Joined {
                    model: table.model.name,
                    alias: table.alias.clone(),
                    columns: columns.clone(),
                });
                columns
            }
        };
        for column in new_columns {
            let select_alias = self
                .dialector
                .quote(&format!("{}__{}", table.alias, column));
            self.selects
                .push(format!("{} AS {select_alias}", table.column(&column)));
        }
    }

    // ==================== Pass 2: predicates ====================

    /// The AND of every predicate in the tree, parenthesized, without the
    /// `WHERE` keyword. Empty when nothing filters.
    pub fn where_clause(&self, nodes: &[ConditionNode]) -> CqlResult<Sql> {
        let mut predicates = Vec::new();
        self.predicates(nodes, &self.root, &mut predicates)?;

        if let Some(deleted_at) = self.root.model.deleted_at
            && !nodes.iter().any(|c| c.affects_column(deleted_at))
        {
            predicates.push(Sql::new(format!(
                "{} IS NULL",
                self.root.column(deleted_at)
            )));
        }

        if predicates.is_empty() {
            return Ok(Sql::empty());
        }
        let mut out = Sql::new("(");
        out.push_joined(predicates, " AND ").push(")");
        Ok(out)
    }

    fn predicates(&self, nodes: &[ConditionNode], table: &Table, out: &mut Vec<Sql>) -> CqlResult<()> {
        for node in nodes {
            match node {
                ConditionNode::Join(join) => {
                    let joined = table.deliver(join);
                    self.predicates(&join.conditions, &joined, out)?;
                }
                ConditionNode::Preload { .. } | ConditionNode::Collection { .. } => {}
                other => {
                    let sql = self.condition(other, table)?;
                    if !sql.is_empty() {
                        out.push(sql);
                    }
                }
            }
        }
        Ok(())
    }

    fn condition(&self, node: &ConditionNode, table: &Table) -> CqlResult<Sql> {
        match node {
            ConditionNode::Field {
                field,
                operator,
                values,
                escape,
            } => {
                let lhs = self.column(field, table)?;
                let operands = values.iter().map(bind).collect();
                self.comparison(lhs, *operator, operands, escape.as_ref())
            }
            ConditionNode::DynamicField {
                field,
                operator,
                operands,
            } => {
                let lhs = self.column(field, table)?;
                let operands = operands
                    .iter()
                    .map(|operand| match operand {
                        Operand::Value(value) => Ok(bind(value)),
                        Operand::Field(other) => self.reference(other),
                    })
                    .collect::<CqlResult<Vec<_>>>()?;
                self.comparison(lhs, *operator, operands, None)
            }
            ConditionNode::Connector {
                operator,
                conditions,
            } => self.connector(*operator, conditions, table),
            ConditionNode::Exists(exists) => self.exists(exists, table),
            ConditionNode::Unsafe { sql, values } => {
                let mut out = Sql::empty();
                out.push_fragment_for(
                    self.dialector,
                    &sql.replace("{table}", &table.alias),
                    values.iter().cloned(),
                );
                Ok(out)
            }
            ConditionNode::Join(_) | ConditionNode::Preload { .. } | ConditionNode::Collection { .. } => {
                Ok(Sql::empty())
            }
        }
    }

    /// `EXISTS (SELECT 1 FROM <table> <alias> WHERE <key> AND <predicates>)`
    /// over a has-many relation of `parent`.
    fn exists(&self, exists: &JoinNode, parent: &Table) -> CqlResult<Sql> {
        let table = parent.deliver(exists);

        let mut parts = vec![Sql::new(format!(
            "{} = {}",
            table.column(exists.foreign_column),
            parent.column(exists.local_column),
        ))];
        for condition in &exists.conditions {
            let sql = self.condition(condition, &table)?;
            if !sql.is_empty() {
                parts.push(sql);
            }
        }
        if let Some(deleted_at) = exists.target.deleted_at
            && !exists.conditions.iter().any(|c| c.affects_column(deleted_at))
        {
            parts.push(Sql::new(format!("{} IS NULL", table.column(deleted_at))));
        }

        let mut out = Sql::new(format!(
            "EXISTS (SELECT 1 FROM {} {} WHERE ",
            exists.target.table, table.alias
        ));
        out.push_joined(parts, " AND ").push(")");
        Ok(out)
    }

    fn connector(&self, operator: Operator, conditions: &[ConditionNode], table: &Table) -> CqlResult<Sql> {
        let token = operator.resolve(self.dialector)?;

        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let sql = self.condition(condition, table)?;
            if !sql.is_empty() {
                parts.push(sql);
            }
        }

        if parts.is_empty() {
            return match operator {
                Operator::And | Operator::Or => Ok(Sql::empty()),
                _ => Err(CqlError::malformed(format!(
                    "{} requires at least one condition",
                    operator.name()
                ))),
            };
        }

        let mut out = Sql::new("(");
        if operator == Operator::Not {
            out.push(token).push(" (");
            out.push_joined(parts, &format!(" {} ", Operator::And.sql()));
            out.push(")");
        } else {
            out.push_joined(parts, &format!(" {token} "));
        }
        out.push(")");
        Ok(out)
    }

    fn comparison(
        &self,
        lhs: Sql,
        operator: Operator,
        operands: Vec<Sql>,
        escape: Option<&Value>,
    ) -> CqlResult<Sql> {
        let token = operator.resolve(self.dialector)?;

        let mut out = Sql::empty();
        if operator.negated_on(self.dialector) {
            out.push("NOT ");
        }
        out.push_sql(lhs);
        out.push(" ").push(token);

        match operator {
            Operator::IsNull | Operator::IsNotNull => {}
            Operator::Between | Operator::NotBetween => {
                let [from, to]: [Sql; 2] = operands.try_into().map_err(|_| {
                    CqlError::malformed(format!("{} takes exactly 2 values", operator.name()))
                })?;
                out.push(" ").push_sql(from);
                out.push(" AND ").push_sql(to);
            }
            Operator::ArrayIn | Operator::ArrayNotIn => {
                out.push(" (").push_joined(operands, ", ").push(")");
            }
            _ => {
                for operand in operands {
                    out.push(" ").push_sql(operand);
                }
            }
        }

        if let Some(escape) = escape {
            let token = Operator::Escape.resolve(self.dialector)?;
            out.push(" ").push(token).push(" ").push_bind(escape.clone());
        }
        Ok(out)
    }

    /// A field of the scope's own table, with its functions applied.
    fn column(&self, field: &FieldRef, table: &Table) -> CqlResult<Sql> {
        self.apply_functions(field, table.column(&field.column_name()))
    }

    /// A field of any table of the statement, with its functions applied.
    pub fn reference(&self, field: &FieldRef) -> CqlResult<Sql> {
        let alias = self.alias_for(field)?;
        self.apply_functions(field, format!("{alias}.{}", field.column_name()))
    }

    /// `<alias>.<column>` of a field assigned by an `UPDATE`. Fields of the
    /// root model name the updated table unless an appearance is selected.
    pub fn target(&self, field: &FieldRef) -> CqlResult<String> {
        if field.belongs_to(&self.root.model) && field.appearance.is_none() {
            return Ok(self.root.column(&field.column_name()));
        }
        let alias = self.alias_for(field)?;
        Ok(format!("{alias}.{}", field.column_name()))
    }

    fn alias_for(&self, field: &FieldRef) -> CqlResult<String> {
        let candidates: Vec<&Table> = self
            .tables
            .iter()
            .filter(|t| t.model == field.model)
            .collect();

        match (candidates.len(), field.appearance) {
            (0, _) => {
                tracing::warn!(
                    target: "cql.sql",
                    model = field.model.name,
                    field = field.name,
                    "field references a model that is not joined in the query"
                );
                Ok(field.model.table.to_string())
            }
            (1, None) => Ok(candidates[0].alias.clone()),
            (joins, None) => Err(CqlError::AmbiguousModelReference {
                model: field.model.name,
                joins,
            }),
            (joins, Some(appearance)) => candidates
                .get(appearance)
                .map(|t| t.alias.clone())
                .ok_or(CqlError::AppearanceOutOfRange {
                    model: field.model.name,
                    appearance,
                    joins,
                }),
        }
    }

    fn apply_functions(&self, field: &FieldRef, column: String) -> CqlResult<Sql> {
        let mut text = column;
        let mut values = Vec::new();
        for call in &field.functions {
            let strategy = call.function.resolve(self.dialector)?;
            text = strategy.apply(&text, call.values.len());
            let bound = strategy.placeholders(call.values.len());
            values.extend(call.values.iter().take(bound).cloned());
        }

        let mut out = Sql::empty();
        out.push_fragment(&text, values);
        Ok(out)
    }
}

fn nested_joins(join: &JoinNode) -> Vec<JoinNode> {
    join.conditions
        .iter()
        .filter_map(|c| match c {
            ConditionNode::Join(nested) => Some(nested.clone()),
            _ => None,
        })
        .collect()
}

/// Compile the predicates of `nodes` in a statement rooted at `root`.
pub(crate) fn compile_where(
    root: ModelRef,
    nodes: &[ConditionNode],
    dialector: Dialector,
) -> CqlResult<Sql> {
    let mut compiler = Compiler::new(root, dialector);
    compiler.plan(nodes)?;
    compiler.where_clause(nodes)
}

#[cfg(test)]
mod tests;
