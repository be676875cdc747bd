//! Model declarations.
//!
//! A model is a named entity backed by a table. Schema code implements
//! [`Model`] once per entity and exposes typed [`Field`](crate::Field) and
//! [`Relation`](crate::Relation) accessors on it.

use crate::field::FieldRef;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named entity type backed by a table.
///
/// # Example
/// ```ignore
/// use cql::{Field, FieldRef, Model};
///
/// struct Seller;
///
/// impl Model for Seller {
///     const NAME: &'static str = "Seller";
///     const TABLE: &'static str = "sellers";
///
///     fn fields() -> Vec<FieldRef> {
///         vec![Seller::id().into(), Seller::name().into()]
///     }
/// }
///
/// impl Seller {
///     pub fn id() -> Field<Seller, i64> {
///         Field::new("ID")
///     }
///
///     pub fn name() -> Field<Seller, String> {
///         Field::new("Name")
///     }
/// }
/// ```
pub trait Model: 'static {
    /// Declared type name, unique within a query.
    const NAME: &'static str;
    /// Backing table.
    const TABLE: &'static str;
    /// Primary-key column.
    const PRIMARY_KEY: &'static str = "id";
    /// Soft-delete column; rows with a non-null value are filtered out.
    const DELETED_AT: Option<&'static str> = None;

    /// Ordered field list, used when the model is preloaded.
    fn fields() -> Vec<FieldRef>;
}

/// Type-erased descriptor of a [`Model`].
#[derive(Clone, Copy)]
pub struct ModelRef {
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub deleted_at: Option<&'static str>,
    fields: fn() -> Vec<FieldRef>,
}

impl ModelRef {
    pub fn of<M: Model>() -> Self {
        Self {
            name: M::NAME,
            table: M::TABLE,
            primary_key: M::PRIMARY_KEY,
            deleted_at: M::DELETED_AT,
            fields: M::fields,
        }
    }

    pub fn fields(&self) -> Vec<FieldRef> {
        (self.fields)()
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.table == other.table
    }
}

impl Eq for ModelRef {}

impl Hash for ModelRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.table.hash(state);
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("name", &self.name)
            .field("table", &self.table)
            .finish()
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
