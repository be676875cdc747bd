//! `syn` front end: Rust source to [`CallTree`]s.

use crate::tree::{CallTree, NodeKind, Position};
use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{Expr, GenericArgument, PathArguments, Token, Type};

fn position(span: Span) -> Position {
    let start = span.start();
    Position::new(start.line, start.column + 1)
}

fn path_segments(path: &syn::Path) -> Vec<String> {
    path.segments.iter().map(|s| s.ident.to_string()).collect()
}

/// Last segment of every type argument of the last path segment:
/// `query::<models::Phone>` gives `["Phone"]`.
fn generic_models(path: &syn::Path) -> Vec<String> {
    let Some(last) = path.segments.last() else {
        return Vec::new();
    };
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return Vec::new();
    };
    args.args
        .iter()
        .filter_map(|arg| match arg {
            GenericArgument::Type(Type::Path(ty)) => {
                ty.path.segments.last().map(|s| s.ident.to_string())
            }
            _ => None,
        })
        .collect()
}

fn node(kind: NodeKind, children: Vec<CallTree>, span: Span) -> CallTree {
    CallTree {
        kind,
        children,
        position: position(span),
    }
}

/// Convert an expression, looking through `?`, `&`, parentheses and
/// `.await`.
pub fn convert(expr: &Expr) -> CallTree {
    match expr {
        Expr::Call(call) => match &*call.func {
            Expr::Path(func) => node(
                NodeKind::Call {
                    path: path_segments(&func.path),
                    generics: generic_models(&func.path),
                },
                call.args.iter().map(convert).collect(),
                func.span(),
            ),
            _ => node(NodeKind::Other, Vec::new(), call.span()),
        },
        Expr::MethodCall(call) => {
            let mut children = Vec::with_capacity(call.args.len() + 1);
            children.push(convert(&call.receiver));
            children.extend(call.args.iter().map(convert));
            node(
                NodeKind::MethodCall {
                    method: call.method.to_string(),
                },
                children,
                call.method.span(),
            )
        }
        Expr::Array(array) => node(
            NodeKind::List,
            array.elems.iter().map(convert).collect(),
            array.span(),
        ),
        Expr::Macro(mac) if mac.mac.path.is_ident("vec") => {
            match mac
                .mac
                .parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
            {
                Ok(elems) => node(NodeKind::List, elems.iter().map(convert).collect(), mac.span()),
                // `vec![x; n]`
                Err(_) => node(NodeKind::Other, Vec::new(), mac.span()),
            }
        }
        Expr::Try(e) => convert(&e.expr),
        Expr::Paren(e) => convert(&e.expr),
        Expr::Reference(e) => convert(&e.expr),
        Expr::Group(e) => convert(&e.expr),
        Expr::Await(e) => convert(&e.base),
        other => node(NodeKind::Other, Vec::new(), other.span()),
    }
}

/// Base of a method chain: `a().b().c()` gives `a()`.
fn chain_base(mut expr: &Expr) -> &Expr {
    loop {
        match expr {
            Expr::MethodCall(call) => expr = &call.receiver,
            Expr::Try(e) => expr = &e.expr,
            Expr::Await(e) => expr = &e.base,
            Expr::Paren(e) => expr = &e.expr,
            _ => return expr,
        }
    }
}

struct CallSiteVisitor<'a> {
    query_functions: &'a [String],
    sites: Vec<CallTree>,
}

impl CallSiteVisitor<'_> {
    fn is_query_call(&self, expr: &Expr) -> bool {
        let Expr::Call(call) = chain_base(expr) else {
            return false;
        };
        let Expr::Path(func) = &*call.func else {
            return false;
        };
        func.path
            .segments
            .last()
            .is_some_and(|s| self.query_functions.iter().any(|q| s.ident == q))
    }
}

impl<'ast> Visit<'ast> for CallSiteVisitor<'_> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        // The outermost expression of a chain is the call site; the chain
        // itself is not visited again.
        let chain = matches!(expr, Expr::Call(_) | Expr::MethodCall(_));
        if chain && self.is_query_call(expr) {
            self.sites.push(convert(chain_root(expr)));
            return;
        }
        visit::visit_expr(self, expr);
    }
}

/// Strip a trailing `?` or `.await` so the site starts at the last call.
fn chain_root(expr: &Expr) -> &Expr {
    match expr {
        Expr::Try(e) => chain_root(&e.expr),
        Expr::Await(e) => chain_root(&e.base),
        other => other,
    }
}

/// Every statement chain in `file` that starts with one of
/// `query_functions`, in source order.
pub fn call_sites(file: &syn::File, query_functions: &[String]) -> Vec<CallTree> {
    let mut visitor = CallSiteVisitor {
        query_functions,
        sites: Vec::new(),
    };
    visitor.visit_file(file);
    visitor.sites
}
