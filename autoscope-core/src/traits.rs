//! Capability contracts consumed by the engine
//!
//! The engine never looks inside a collection or a type hierarchy; it only
//! calls through these two traits.

use crate::{Pagination, ScopeResult, TypeDescriptor, Value};

/// An immutable, composable view over a set of records.
///
/// Every method returns a new collection; `self` is left untouched.
pub trait Collection: Clone {
    /// The declared type of the records in this collection.
    ///
    /// Exposed for inspection only. Scope application takes the model type
    /// from the engine and never consults this.
    fn model_type(&self) -> &TypeDescriptor;

    /// Apply a named operation with positional arguments.
    fn apply_operation(&self, name: &str, args: &[Value]) -> ScopeResult<Self>;

    /// Restrict to a subtype, keeping every condition already present.
    fn restrict_to_type(&self, ty: &TypeDescriptor) -> ScopeResult<Self>;

    /// Restrict to records whose identifier is one of `ids`.
    fn restrict_to_ids(&self, ids: &[Value]) -> ScopeResult<Self>;

    /// Select one page of the collection.
    fn paginate(&self, pagination: Pagination) -> ScopeResult<Self>;
}

/// Resolves type names within a record hierarchy.
pub trait TypeResolver {
    /// Look up a type by name.
    fn resolve(&self, name: &str) -> Option<TypeDescriptor>;

    /// True when `candidate` is a strict descendant of `base`.
    fn is_descendant_of(&self, candidate: &TypeDescriptor, base: &TypeDescriptor) -> bool;
}

impl<T: TypeResolver + ?Sized> TypeResolver for &T {
    fn resolve(&self, name: &str) -> Option<TypeDescriptor> {
        (**self).resolve(name)
    }

    fn is_descendant_of(&self, candidate: &TypeDescriptor, base: &TypeDescriptor) -> bool {
        (**self).is_descendant_of(candidate, base)
    }
}
