//! Names the analyzer recognises.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Names of the functions and methods that build queries and conditions.
///
/// Deserialized from the `[lint]` section of `cql.toml`; every key is
/// optional and falls back to the cql defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Functions that start a statement: `query::<M>(conditions)`.
    pub query_functions: Vec<String>,
    /// Functions combining conditions: `and(vec![..])`.
    pub connector_functions: Vec<String>,
    /// Methods on a statement taking a field of a joined model.
    pub order_methods: Vec<String>,
    /// Update methods taking fields of joined models.
    pub set_methods: Vec<String>,
    /// Methods on a field handle that produce a condition.
    pub comparison_methods: Vec<String>,
    /// Methods on a has-many relation that produce an `EXISTS` condition.
    pub collection_methods: Vec<String>,
    /// Relation name to model name, for relations not named after their
    /// model. Without an alias a relation leads to its own name and its
    /// singular: `sellers` to `Sellers` and `Seller`.
    pub relation_aliases: BTreeMap<String, String>,
    /// Models whose handles are checked when used as unsafe operands, on top
    /// of the models the file's call sites name.
    pub models: Vec<String>,
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            query_functions: strings(&["query", "update", "delete"]),
            connector_functions: strings(&["and", "or", "not", "xor"]),
            order_methods: strings(&["ascending", "descending"]),
            set_methods: strings(&["set_dynamic", "set_multiple"]),
            comparison_methods: strings(&[
                "eq",
                "ne",
                "lt",
                "lt_or_eq",
                "gt",
                "gt_or_eq",
                "between",
                "not_between",
                "is_distinct",
                "is_not_distinct",
                "null_safe_eq",
                "is_null",
                "is_not_null",
                "in_list",
                "not_in",
                "is",
                "like",
                "like_escape",
                "ilike",
                "similar_to",
                "posix_match",
                "posix_imatch",
                "regexp",
                "glob",
            ]),
            collection_methods: strings(&["any", "none", "all"]),
            relation_aliases: BTreeMap::new(),
            models: Vec::new(),
        }
    }
}

impl LintConfig {
    pub fn is_query_function(&self, name: &str) -> bool {
        self.query_functions.iter().any(|n| n == name)
    }

    pub fn is_connector(&self, name: &str) -> bool {
        self.connector_functions.iter().any(|n| n == name)
    }

    pub fn is_order_method(&self, name: &str) -> bool {
        self.order_methods.iter().any(|n| n == name)
    }

    pub fn is_set_method(&self, name: &str) -> bool {
        self.set_methods.iter().any(|n| n == name)
    }

    pub fn is_comparison(&self, name: &str) -> bool {
        self.comparison_methods.iter().any(|n| n == name)
    }

    pub fn is_collection_method(&self, name: &str) -> bool {
        self.collection_methods.iter().any(|n| n == name)
    }
}
