//! Front-end independent view of a call site.
//!
//! The analyzer only needs to know, for every expression of a query
//! construction, whether it is a function call, a method call or a list, and
//! what its sub-expressions are. [`SyntaxNode`] is that view; [`CallTree`] is
//! the owned implementation built by the `syn` front end and by tests.

use serde::Serialize;
use std::fmt;

/// 1-based line and column of a node in its source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Shape of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `a::b::c::<G>(args)`: path segments and the type arguments of the last
    /// segment. Children are the arguments.
    Call {
        path: Vec<String>,
        generics: Vec<String>,
    },
    /// `receiver.method(args)`. Child 0 is the receiver, the rest are the
    /// arguments.
    MethodCall { method: String },
    /// `[a, b]` or `vec![a, b]`. Children are the elements.
    List,
    /// Anything else: literals, variables, closures.
    Other,
}

/// Minimal interface the analyzer walks.
pub trait SyntaxNode: Sized {
    fn kind(&self) -> &NodeKind;
    fn children(&self) -> &[Self];
    fn position(&self) -> Position;

    /// Last segment of a call path, or the method name.
    fn name(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Call { path, .. } => path.last().map(String::as_str),
            NodeKind::MethodCall { method } => Some(method),
            NodeKind::List | NodeKind::Other => None,
        }
    }
}

/// Owned call tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTree {
    pub kind: NodeKind,
    pub children: Vec<CallTree>,
    pub position: Position,
}

impl CallTree {
    /// `path(args)`, with the path given as `"Model::field"`.
    pub fn call(path: &str, args: Vec<CallTree>) -> Self {
        Self::call_generic(path, &[], args)
    }

    /// `path::<generics>(args)`.
    pub fn call_generic(path: &str, generics: &[&str], args: Vec<CallTree>) -> Self {
        Self {
            kind: NodeKind::Call {
                path: path.split("::").map(str::to_string).collect(),
                generics: generics.iter().map(|g| g.to_string()).collect(),
            },
            children: args,
            position: Position::default(),
        }
    }

    /// `receiver.method(args)`.
    pub fn method(receiver: CallTree, method: &str, args: Vec<CallTree>) -> Self {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(receiver);
        children.extend(args);
        Self {
            kind: NodeKind::MethodCall {
                method: method.to_string(),
            },
            children,
            position: Position::default(),
        }
    }

    pub fn list(elements: Vec<CallTree>) -> Self {
        Self {
            kind: NodeKind::List,
            children: elements,
            position: Position::default(),
        }
    }

    pub fn other() -> Self {
        Self {
            kind: NodeKind::Other,
            children: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.position = Position::new(line, column);
        self
    }
}

impl SyntaxNode for CallTree {
    fn kind(&self) -> &NodeKind {
        &self.kind
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn position(&self) -> Position {
        self.position
    }
}
