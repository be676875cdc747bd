//! Load-state checks for hydrated relations.
//!
//! After a query runs, a relation field can be absent for two reasons: the
//! relation is legitimately empty, or the query never preloaded it. These
//! helpers tell the two apart from the foreign key and return
//! [`CqlError::RelationNotLoaded`] for the latter.
//!
//! # Example
//! ```ignore
//! impl Seller {
//!     pub fn get_company(&self) -> CqlResult<Option<&Company>> {
//!         preload::verify_pointer_loaded(self.company_id.as_ref(), self.company.as_ref())
//!     }
//! }
//! ```

use crate::error::{CqlError, CqlResult};
use uuid::Uuid;

/// A related object embedded by value, which knows whether it was hydrated.
pub trait Loadable {
    fn is_loaded(&self) -> bool;
}

/// A non-nullable key type with a distinguished "no relation" value.
pub trait NullableId {
    fn is_nil(&self) -> bool;
}

impl NullableId for Uuid {
    fn is_nil(&self) -> bool {
        Uuid::is_nil(self)
    }
}

macro_rules! impl_nullable_int_id {
    ($($ty:ty),*) => {
        $(
            impl NullableId for $ty {
                fn is_nil(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

impl_nullable_int_id!(i32, i64, u32, u64);

/// A relation embedded by value: it must be present and loaded.
pub fn verify_struct_loaded<T: Loadable>(relation: Option<&T>) -> CqlResult<&T> {
    match relation {
        Some(r) if r.is_loaded() => Ok(r),
        _ => Err(CqlError::not_loaded::<T>()),
    }
}

/// A relation keyed by a nullable foreign key: a set key with no related
/// object means the relation was not loaded.
pub fn verify_pointer_loaded<'a, Id, T>(
    id: Option<&Id>,
    relation: Option<&'a T>,
) -> CqlResult<Option<&'a T>> {
    if id.is_some() && relation.is_none() {
        return Err(CqlError::not_loaded::<T>());
    }
    Ok(relation)
}

/// A relation keyed by a non-nullable foreign key: a non-nil key with no
/// related object means the relation was not loaded.
pub fn verify_pointer_with_id_loaded<'a, Id: NullableId, T>(
    id: &Id,
    relation: Option<&'a T>,
) -> CqlResult<Option<&'a T>> {
    if !id.is_nil() && relation.is_none() {
        return Err(CqlError::not_loaded::<T>());
    }
    Ok(relation)
}

/// A has-many collection: `None` means never loaded, an empty vector means
/// loaded with no rows.
pub fn verify_collection_loaded<T>(collection: Option<&Vec<T>>) -> CqlResult<&[T]> {
    collection
        .map(Vec::as_slice)
        .ok_or_else(CqlError::not_loaded::<T>)
}
