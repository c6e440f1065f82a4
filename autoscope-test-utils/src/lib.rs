//! autoscope Test Utilities
//!
//! Shared test infrastructure for the autoscope workspace:
//! - A recording collection that logs every call the engine makes
//! - A static type hierarchy for resolver-only tests
//! - Proptest generators for signatures and request values
//! - Seeded catalogs for end-to-end tests
//! - Assertions over scope errors and query conditions

// Re-export the in-memory collection from its source crate
pub use autoscope_storage::{Catalog, Query, Record};

// Re-export core types for convenience
pub use autoscope_core::{
    ArgDef, Cardinality, Collection, CollectionError, Pagination, ParamsError, RequestParams,
    ScopeError, ScopeResult, Signature, TypeDescriptor, TypeResolver, Value,
};

use std::collections::HashMap;

// ============================================================================
// RECORDING COLLECTION
// ============================================================================

/// One call made against a `RecordingCollection`.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Operation { name: String, args: Vec<Value> },
    Type(String),
    Ids(Vec<Value>),
    Paginate(Pagination),
}

impl Call {
    pub fn operation(name: impl Into<String>, args: Vec<Value>) -> Self {
        Call::Operation {
            name: name.into(),
            args,
        }
    }
}

/// A collection that holds no records and remembers every call, in order.
///
/// Operations named in `rejecting` fail with `UnknownOperation`; everything
/// else succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingCollection {
    model: TypeDescriptor,
    calls: Vec<Call>,
    rejected: Vec<String>,
}

impl RecordingCollection {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: TypeDescriptor::new(model),
            calls: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn rejecting(mut self, operation: impl Into<String>) -> Self {
        self.rejected.push(operation.into());
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    fn record(&self, call: Call) -> Self {
        let mut next = self.clone();
        next.calls.push(call);
        next
    }
}

impl Collection for RecordingCollection {
    fn model_type(&self) -> &TypeDescriptor {
        &self.model
    }

    fn apply_operation(&self, name: &str, args: &[Value]) -> ScopeResult<Self> {
        if self.rejected.iter().any(|r| r == name) {
            return Err(CollectionError::UnknownOperation {
                model: self.model.name().to_string(),
                name: name.to_string(),
            }
            .into());
        }
        Ok(self.record(Call::operation(name, args.to_vec())))
    }

    fn restrict_to_type(&self, ty: &TypeDescriptor) -> ScopeResult<Self> {
        let mut next = self.record(Call::Type(ty.name().to_string()));
        next.model = ty.clone();
        Ok(next)
    }

    fn restrict_to_ids(&self, ids: &[Value]) -> ScopeResult<Self> {
        Ok(self.record(Call::Ids(ids.to_vec())))
    }

    fn paginate(&self, pagination: Pagination) -> ScopeResult<Self> {
        Ok(self.record(Call::Paginate(pagination)))
    }
}

// ============================================================================
// STATIC HIERARCHY
// ============================================================================

/// A type hierarchy declared up front, with no records behind it.
#[derive(Debug, Clone, Default)]
pub struct StaticHierarchy {
    parents: HashMap<String, Option<String>>,
}

impl StaticHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, name: impl Into<String>) -> Self {
        self.parents.insert(name.into(), None);
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.insert(name.into(), Some(parent.into()));
        self
    }
}

impl TypeResolver for StaticHierarchy {
    fn resolve(&self, name: &str) -> Option<TypeDescriptor> {
        self.parents
            .contains_key(name)
            .then(|| TypeDescriptor::new(name))
    }

    fn is_descendant_of(&self, candidate: &TypeDescriptor, base: &TypeDescriptor) -> bool {
        let mut current = self.parents.get(candidate.name()).cloned().flatten();
        // Bounded so a cyclic declaration cannot loop forever.
        for _ in 0..self.parents.len() {
            match current {
                Some(parent) if parent == base.name() => return true,
                Some(parent) => current = self.parents.get(&parent).cloned().flatten(),
                None => return false,
            }
        }
        false
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for scope declarations and request values.

    use super::*;
    use proptest::prelude::*;

    /// Generate a valid scope name.
    pub fn arb_scope_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}"
    }

    /// Generate a Cardinality variant.
    pub fn arb_cardinality() -> impl Strategy<Value = Cardinality> {
        prop_oneof![
            Just(Cardinality::Required),
            Just(Cardinality::Optional),
            Just(Cardinality::Rest),
        ]
    }

    /// Generate a valid signature: required, then optional, then at most
    /// one trailing rest argument. Names are unique.
    pub fn arb_signature() -> impl Strategy<Value = Signature> {
        (0usize..4, 0usize..3, any::<bool>()).prop_map(|(required, optional, rest)| {
            let mut signature = Signature::new();
            for i in 0..required {
                signature = signature.req(format!("req{i}"));
            }
            for i in 0..optional {
                signature = signature.opt(format!("opt{i}"));
            }
            if rest {
                signature = signature.rest("rest");
            }
            signature
        })
    }

    /// Generate a signature with at least one argument.
    pub fn arb_dynamic_signature() -> impl Strategy<Value = Signature> {
        arb_signature().prop_filter("needs an argument", |s| !s.is_empty())
    }

    /// Generate a string value as it would arrive from a query string.
    pub fn arb_string_value() -> impl Strategy<Value = Value> {
        "[a-z0-9]{0,8}".prop_map(Value::String)
    }

    /// Generate a page or per-page value that is valid after parsing.
    pub fn arb_page_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            (1u32..1000).prop_map(Value::from),
            (1u32..1000).prop_map(|n| Value::String(n.to_string())),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Seeded catalogs for end-to-end tests.

    use super::*;
    use autoscope_storage::SortDirection;

    pub use autoscope_storage::demo::blog_catalog;

    /// Build request parameters from a JSON object.
    #[track_caller]
    pub fn params(value: Value) -> RequestParams {
        match RequestParams::from_json(value) {
            Ok(params) => params,
            Err(err) => panic!("Invalid fixture params: {err}"),
        }
    }

    /// `Post`, `User` and `Admin < User`.
    ///
    /// `Post` declares `blank_arg_scope(user_id)`, `user_id_scope(user_id)`,
    /// `vararg_scope(*ids)`, `two_param_scope(id1, id2)`, `no_param_scope`
    /// and the bare method `blah`; `protected_scope_test(user_id)` is defined
    /// but not exposed. `User` declares `name_scope(name)`.
    ///
    /// Posts 1..=6 belong to users `(n % 2) + 1`; even posts are published
    /// and post 3 is titled `blah`.
    pub fn scope_suite_catalog() -> Catalog {
        let catalog = Catalog::builder()
            .model("Post", |m| {
                m.scope("blank_arg_scope", Signature::new().req("user_id"), |q, args| {
                    Ok(q.where_eq("user_id", args[0].clone()))
                })
                .scope("user_id_scope", Signature::new().req("user_id"), |q, args| {
                    Ok(q.where_eq("user_id", args[0].clone()))
                })
                .scope("vararg_scope", Signature::new().rest("ids"), |q, args| {
                    Ok(q.where_in("id", args.to_vec()))
                })
                .scope(
                    "two_param_scope",
                    Signature::new().req("id1").req("id2"),
                    |q, args| Ok(q.where_in("id", args.to_vec())),
                )
                .scope("no_param_scope", Signature::new(), |q, _| {
                    Ok(q.where_eq("published", Value::Bool(true)))
                })
                .protected_scope(
                    "protected_scope_test",
                    Signature::new().req("user_id"),
                    |q, args| Ok(q.where_eq("user_id", args[0].clone())),
                )
                .bare_method("blah", |q| Ok(q.where_eq("title", Value::from("blah"))))
            })
            .model("User", |m| {
                m.scope("name_scope", Signature::new().req("name"), |q, args| {
                    Ok(q.where_eq("name", args[0].clone()))
                })
            })
            .subtype("Admin", "User", |m| m)
            .build();

        let catalog = match catalog {
            Ok(catalog) => catalog,
            Err(err) => panic!("Invalid suite catalog: {err}"),
        };

        let seeded = catalog
            .insert_all([
                Record::new("User").with("name", "Dan"),
                Record::new("Admin").with("name", "Dan"),
                Record::new("Admin").with("name", "Eve"),
            ])
            .and_then(|_| {
                catalog.insert_all((1..=6u64).map(|n| {
                    let title = if n == 3 { "blah".to_string() } else { format!("post {n}") };
                    Record::new("Post")
                        .with("title", title)
                        .with("user_id", (n % 2) + 1)
                        .with("published", n % 2 == 0)
                }))
            });
        if let Err(err) = seeded {
            panic!("Could not seed suite catalog: {err}");
        }

        catalog
    }

    /// Every post, newest first.
    pub fn posts_newest_first(catalog: &Catalog) -> ScopeResult<Query> {
        Ok(catalog.all("Post")?.order_by("id", SortDirection::Desc))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over scope errors and query conditions.

    use super::*;

    /// Assert that a ScopeResult is a Params error.
    #[track_caller]
    pub fn assert_params_error<T: std::fmt::Debug>(result: &ScopeResult<T>) {
        match result {
            Err(ScopeError::Params(_)) => {}
            other => panic!("Expected Params error, got: {:?}", other),
        }
    }

    /// Assert that a ScopeResult is a Collection error.
    #[track_caller]
    pub fn assert_collection_error<T: std::fmt::Debug>(result: &ScopeResult<T>) {
        match result {
            Err(ScopeError::Collection(_)) => {}
            other => panic!("Expected Collection error, got: {:?}", other),
        }
    }

    /// Assert that a ScopeResult is an InvalidPagination error for `field`.
    #[track_caller]
    pub fn assert_invalid_pagination<T: std::fmt::Debug>(result: &ScopeResult<T>, field: &str) {
        match result {
            Err(ScopeError::Params(ParamsError::InvalidPagination { field: f, .. })) => {
                assert_eq!(f, field, "Wrong field in InvalidPagination error");
            }
            other => panic!("Expected InvalidPagination for {}, got: {:?}", field, other),
        }
    }

    /// Assert that a query carries an equality or membership condition.
    #[track_caller]
    pub fn assert_where_value(query: &Query, field: &str, expected: Value) {
        let values = query.where_values();
        match values.get(field) {
            Some(actual) => assert_eq!(*actual, expected, "Wrong condition on {}", field),
            None => panic!("No condition on {} in {:?}", field, values),
        }
    }

    /// Assert the ids a query selects, in order.
    #[track_caller]
    pub fn assert_ids(query: &Query, expected: &[u64]) {
        match query.ids() {
            Ok(ids) => assert_eq!(ids, expected, "Wrong ids for {:?}", query),
            Err(err) => panic!("Query failed: {}", err),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
