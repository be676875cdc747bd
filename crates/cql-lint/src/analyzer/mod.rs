//! Join-safety analysis of a single call site.
//!
//! A call site is a statement chain such as
//! `query::<Phone>(vec![..]).descending(Brand::name())`. Its conditions are
//! walked depth first while accumulating the names of the models the
//! statement joins:
//!
//! - the turbofish model and the owner of every field condition are joined;
//! - `Model::relation(conditions)` joins its target before its nested
//!   conditions are walked, and the grown set flows back to the caller, so a
//!   join is visible to the conditions after it at any level, as it is in the
//!   compiled SQL;
//! - `Model::relation().any(conditions)` (and `none`, `all`) walks its
//!   conditions with the relation's target joined, in a scope of its own: the
//!   subquery's join is not visible outside it;
//! - the right-hand field of `field.is_dynamic().cmp(other)` must belong to a
//!   joined model, as must the field of an order or set method.
//!
//! Operands of `field.is_unsafe().cmp(..)` may be arbitrary values, so only
//! those shaped like a field handle of a known model are checked. Known
//! models are the ones named where only models can appear, across every call
//! site of the file (see [`Analyzer::models`]), plus [`LintConfig::models`].
//!
//! Shapes that are not recognised are skipped. A shape that is recognised but
//! cannot be followed fails the call site with [`InspectError`].

use crate::config::LintConfig;
use crate::error::InspectError;
use crate::tree::{NodeKind, Position, SyntaxNode};
use heck::{ToSnakeCase, ToUpperCamelCase};
use std::collections::BTreeSet;

/// A field of a model that the statement does not join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub model: String,
    pub position: Position,
}

/// Names of the models joined so far.
pub type Joined = BTreeSet<String>;

const DYNAMIC: &str = "is_dynamic";
const UNSAFE: &str = "is_unsafe";
const ASSIGN_DYNAMIC: &str = "assign_dynamic";

/// Methods of a field handle that return a field handle.
const FIELD_FUNCTIONS: &[&str] = &[
    "concat",
    "plus",
    "minus",
    "times",
    "divided",
    "modulo",
    "power",
    "square_root",
    "absolute",
    "bit_and",
    "bit_or",
    "bit_xor",
    "bit_not",
    "shift_left",
    "shift_right",
    "appearance",
];

/// Wrappers around a condition that do not change what it joins.
const PASS_THROUGH: &[&str] = &["preload", "into", "unwrap", "expect"];

/// cql's own types, whose associated functions are not relations.
const NON_MODELS: &[&str] = &[
    "Condition",
    "WhereCondition",
    "JoinCondition",
    "Field",
    "Relation",
];

fn is_model_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) && !NON_MODELS.contains(&name)
}

fn split_method<N: SyntaxNode>(node: &N) -> Result<(&N, &[N]), InspectError> {
    node.children()
        .split_first()
        .ok_or_else(|| InspectError::new("method call without receiver"))
}

fn unwrap_pass_through<N: SyntaxNode>(mut node: &N) -> &N {
    while let NodeKind::MethodCall { method } = node.kind()
        && PASS_THROUGH.contains(&method.as_str())
        && let Some(receiver) = node.children().first()
    {
        node = receiver;
    }
    node
}

/// Model owning the field handle at the base of `node`, such as `Brand` for
/// `Brand::name().concat("x")`.
fn field_model<N: SyntaxNode>(node: &N) -> Result<(&str, Position), InspectError> {
    let mut current = node;
    loop {
        match current.kind() {
            NodeKind::MethodCall { .. } => {
                current = split_method(current)?.0;
            }
            NodeKind::Call { path, .. } => {
                return match path.as_slice() {
                    [.., model, _] if current.children().is_empty() && is_model_name(model) => {
                        Ok((model.as_str(), current.position()))
                    }
                    _ => Err(InspectError::new(format!(
                        "{} is not a field handle",
                        path.join("::")
                    ))),
                };
            }
            NodeKind::List | NodeKind::Other => {
                return Err(InspectError::new("expected a field handle"));
            }
        }
    }
}

/// Model of `node` if it is shaped like a field handle: `Model::field()`,
/// optionally followed by field functions. `Utc::now()` has that shape too,
/// so callers also require the model to be known.
fn field_handle<N: SyntaxNode>(node: &N) -> Option<(&str, Position)> {
    let mut current = node;
    loop {
        match current.kind() {
            NodeKind::MethodCall { method } if FIELD_FUNCTIONS.contains(&method.as_str()) => {
                current = current.children().first()?;
            }
            NodeKind::Call { path, .. } if current.children().is_empty() => {
                return match path.as_slice() {
                    [.., model, _] if is_model_name(model) => {
                        Some((model.as_str(), current.position()))
                    }
                    _ => None,
                };
            }
            _ => return None,
        }
    }
}

/// `Model::relation()`, the receiver of a collection predicate.
fn relation_handle<N: SyntaxNode>(node: &N) -> Option<(&str, &str)> {
    match node.kind() {
        NodeKind::Call { path, .. } if node.children().is_empty() => match path.as_slice() {
            [.., model, relation] if is_model_name(model) => {
                Some((model.as_str(), relation.as_str()))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Field operands of a comparison, with lists flattened. Plain values are
/// left out.
fn field_operands<'n, N: SyntaxNode>(args: &'n [N], out: &mut Vec<&'n N>) {
    for arg in args {
        let arg = unwrap_pass_through(arg);
        match arg.kind() {
            NodeKind::List => field_operands(arg.children(), out),
            NodeKind::Other => {}
            NodeKind::Call { .. } | NodeKind::MethodCall { .. } => out.push(arg),
        }
    }
}

/// State of one walk over a call site.
#[derive(Debug, Default)]
struct Visit {
    findings: Vec<Finding>,
    /// Models named where only models can appear.
    seen: Joined,
}

impl Visit {
    fn check(&mut self, joined: &Joined, model: &str, position: Position) {
        self.seen.insert(model.to_string());
        if !joined.contains(model) {
            tracing::trace!(model, %position, "unjoined model reference");
            self.findings.push(Finding {
                model: model.to_string(),
                position,
            });
        }
    }
}

pub struct Analyzer<'c> {
    config: &'c LintConfig,
    known: Joined,
}

impl<'c> Analyzer<'c> {
    pub fn new(config: &'c LintConfig) -> Self {
        Self {
            config,
            known: config.models.iter().cloned().collect(),
        }
    }

    /// Add to the models whose handles are checked as unsafe operands.
    pub fn with_known_models(mut self, models: impl IntoIterator<Item = String>) -> Self {
        self.known.extend(models);
        self
    }

    /// Whether `node` is a statement chain, ending in a query function call.
    pub fn is_call_site<N: SyntaxNode>(&self, node: &N) -> bool {
        let mut current = node;
        loop {
            match current.kind() {
                NodeKind::MethodCall { .. } => match current.children().first() {
                    Some(receiver) => current = receiver,
                    None => return false,
                },
                NodeKind::Call { path, .. } => {
                    return path
                        .last()
                        .is_some_and(|name| self.config.is_query_function(name));
                }
                NodeKind::List | NodeKind::Other => return false,
            }
        }
    }

    /// Findings for one call site, in source order.
    pub fn call_site<N: SyntaxNode>(&self, node: &N) -> Result<Vec<Finding>, InspectError> {
        Ok(self.walk(node)?.findings)
    }

    /// Models the call site names where only models can appear: the
    /// turbofish, field owners, relations and their targets, and the fields
    /// of dynamic comparisons, order and set methods.
    pub fn models<N: SyntaxNode>(&self, node: &N) -> Result<Joined, InspectError> {
        Ok(self.walk(node)?.seen)
    }

    fn walk<'n, N: SyntaxNode>(&self, node: &'n N) -> Result<Visit, InspectError> {
        let mut checked: Vec<&'n [N]> = Vec::new();
        let mut current = node;
        let (root, generics) = loop {
            match current.kind() {
                NodeKind::MethodCall { method } => {
                    let (receiver, args) = split_method(current)?;
                    if self.config.is_order_method(method) || self.config.is_set_method(method) {
                        checked.push(args);
                    }
                    current = receiver;
                }
                NodeKind::Call { path, generics }
                    if path
                        .last()
                        .is_some_and(|name| self.config.is_query_function(name)) =>
                {
                    break (current, generics);
                }
                _ => return Err(InspectError::new("not a statement")),
            }
        };

        let mut joined = Joined::new();
        if let Some(model) = generics.first() {
            joined.insert(model.clone());
        }

        let mut visit = Visit::default();
        let joined = self.conditions(root.children(), joined, &mut visit)?;

        // The chain was walked outside in; its methods apply inside out.
        for args in checked.into_iter().rev() {
            let mut fields = Vec::new();
            field_operands(args, &mut fields);
            for field in fields {
                let (model, position) = field_model(field)?;
                visit.check(&joined, model, position);

                // `Model::field().assign_dynamic(Other::field())` in `set_multiple`.
                if let NodeKind::MethodCall { method } = field.kind()
                    && method == ASSIGN_DYNAMIC
                {
                    let (_, others) = split_method(field)?;
                    let mut operands = Vec::new();
                    field_operands(others, &mut operands);
                    for operand in operands {
                        let (model, position) = field_model(operand)?;
                        visit.check(&joined, model, position);
                    }
                }
            }
        }
        visit.seen.extend(joined);
        Ok(visit)
    }

    fn conditions<N: SyntaxNode>(
        &self,
        nodes: &[N],
        mut joined: Joined,
        visit: &mut Visit,
    ) -> Result<Joined, InspectError> {
        for node in nodes {
            joined = self.condition(node, joined, visit)?;
        }
        Ok(joined)
    }

    fn condition<N: SyntaxNode>(
        &self,
        node: &N,
        mut joined: Joined,
        visit: &mut Visit,
    ) -> Result<Joined, InspectError> {
        let node = unwrap_pass_through(node);
        match node.kind() {
            NodeKind::List => self.conditions(node.children(), joined, visit),
            NodeKind::Call { path, .. } => {
                if path.last().is_some_and(|name| self.config.is_connector(name)) {
                    return self.conditions(node.children(), joined, visit);
                }
                if let [.., model, relation] = path.as_slice()
                    && !node.children().is_empty()
                    && is_model_name(model)
                {
                    joined.insert(model.clone());
                    joined.extend(self.relation_targets(relation));
                    return self.conditions(node.children(), joined, visit);
                }
                Ok(joined)
            }
            NodeKind::MethodCall { method } if self.config.is_comparison(method) => {
                let (receiver, args) = split_method(node)?;
                match receiver.kind() {
                    NodeKind::MethodCall { method } if method == DYNAMIC => {
                        let (field, _) = split_method(receiver)?;
                        let (owner, _) = field_model(field)?;
                        joined.insert(owner.to_string());

                        let mut fields = Vec::new();
                        field_operands(args, &mut fields);
                        for field in fields {
                            let (model, position) = field_model(field)?;
                            visit.check(&joined, model, position);
                        }
                    }
                    NodeKind::MethodCall { method } if method == UNSAFE => {
                        let (field, _) = split_method(receiver)?;
                        let (owner, _) = field_model(field)?;
                        joined.insert(owner.to_string());

                        let mut operands = Vec::new();
                        field_operands(args, &mut operands);
                        for operand in operands {
                            if let Some((model, position)) = field_handle(operand)
                                && self.known.contains(model)
                            {
                                visit.check(&joined, model, position);
                            }
                        }
                    }
                    _ => {
                        let (owner, _) = field_model(receiver)?;
                        joined.insert(owner.to_string());
                    }
                }
                Ok(joined)
            }
            NodeKind::MethodCall { method } if self.config.is_collection_method(method) => {
                let (receiver, args) = split_method(node)?;
                let Some((model, relation)) = relation_handle(receiver) else {
                    return Ok(joined);
                };
                joined.insert(model.to_string());

                let mut scope = joined.clone();
                scope.extend(self.relation_targets(relation));
                let scope = self.conditions(args, scope, visit)?;
                visit.seen.extend(scope);
                Ok(joined)
            }
            NodeKind::MethodCall { .. } | NodeKind::Other => Ok(joined),
        }
    }

    /// Models a relation may lead to: its alias, or else its name and the
    /// singular of its name, so `sellers` leads to `Seller`.
    fn relation_targets(&self, relation: &str) -> Vec<String> {
        if let Some(alias) = self.config.relation_aliases.get(relation) {
            return vec![alias.clone()];
        }
        let name = relation.to_upper_camel_case();
        let singular =
            pluralizer::pluralize(&relation.to_snake_case(), 1, false).to_upper_camel_case();
        if singular == name {
            vec![name]
        } else {
            vec![name, singular]
        }
    }
}
