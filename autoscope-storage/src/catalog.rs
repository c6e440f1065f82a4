//! Model catalog: type hierarchy, scope declarations, and record tables
//!
//! Models that share a root share one table and are told apart by the
//! record's `type` header (single-table inheritance). Each model owns its
//! own `ScopeRegistry`; a subtype starts with an empty registry unless it
//! opts into `inherit_scopes`.

use crate::query::Query;
use crate::record::Record;
use autoscope_core::{
    CollectionError, ConfigError, ScopeError, ScopeResult, Signature, TypeDescriptor,
    TypeResolver, Value,
};
use autoscope_registry::{DefaultScope, ScopeRegistry, ScopedModel};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Body of a named operation on a model.
pub type ScopeFn = Arc<dyn Fn(&Query, &[Value]) -> ScopeResult<Query> + Send + Sync>;

type Table = RwLock<BTreeMap<u64, Record>>;

// =============================================================================
// MODEL DEFINITIONS
// =============================================================================

/// A callable operation and the positional shape it accepts.
#[derive(Clone)]
pub(crate) struct Operation {
    pub(crate) signature: Signature,
    pub(crate) body: ScopeFn,
}

/// A built model: its place in the hierarchy, its registry, and the
/// operations it defines itself.
pub struct ModelDef {
    pub(crate) descriptor: TypeDescriptor,
    pub(crate) parent: Option<Arc<ModelDef>>,
    pub(crate) table: String,
    pub(crate) registry: ScopeRegistry,
    pub(crate) operations: HashMap<String, Operation>,
}

impl ModelDef {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn parent(&self) -> Option<&ModelDef> {
        self.parent.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    /// True for a model with no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Find an operation on this model or the nearest ancestor defining it.
    pub(crate) fn lookup(&self, name: &str) -> Option<&Operation> {
        let mut current = Some(self);
        while let Some(def) = current {
            if let Some(op) = def.operations.get(name) {
                return Some(op);
            }
            current = def.parent.as_deref();
        }
        None
    }

    /// True when `base` appears strictly above this model.
    pub(crate) fn has_ancestor(&self, base: &str) -> bool {
        let mut current = self.parent.as_deref();
        while let Some(def) = current {
            if def.name() == base {
                return true;
            }
            current = def.parent.as_deref();
        }
        false
    }
}

impl fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<&String> = self.operations.keys().collect();
        operations.sort();
        f.debug_struct("ModelDef")
            .field("name", &self.name())
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .field("table", &self.table)
            .field("operations", &operations)
            .finish()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

enum Exposure {
    Scope(String, Signature),
    Bare(String),
}

/// Declares one model. Obtained through `CatalogBuilder::model` or
/// `CatalogBuilder::subtype`.
pub struct ModelBuilder {
    name: String,
    parent: Option<String>,
    inherit_scopes: bool,
    exposures: Vec<Exposure>,
    operations: HashMap<String, Operation>,
}

impl ModelBuilder {
    fn new(name: String, parent: Option<String>) -> Self {
        Self {
            name,
            parent,
            inherit_scopes: false,
            exposures: Vec::new(),
            operations: HashMap::new(),
        }
    }

    /// Define an operation and expose it to request parameters.
    pub fn scope<F>(mut self, name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(&Query, &[Value]) -> ScopeResult<Query> + Send + Sync + 'static,
    {
        self.exposures
            .push(Exposure::Scope(name.to_string(), signature.clone()));
        self.define(name, signature, body)
    }

    /// Define an operation callable in code but invisible to request
    /// parameters.
    pub fn protected_scope<F>(self, name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(&Query, &[Value]) -> ScopeResult<Query> + Send + Sync + 'static,
    {
        self.define(name, signature, body)
    }

    /// Define a zero-argument method and expose it as a static scope.
    pub fn bare_method<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&Query) -> ScopeResult<Query> + Send + Sync + 'static,
    {
        self.exposures.push(Exposure::Bare(name.to_string()));
        self.define(name, Signature::new(), move |query, _| body(query))
    }

    /// Start this model's registry from a copy of the parent's.
    pub fn inherit_scopes(mut self) -> Self {
        self.inherit_scopes = true;
        self
    }

    fn define<F>(mut self, name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(&Query, &[Value]) -> ScopeResult<Query> + Send + Sync + 'static,
    {
        self.operations.insert(
            name.to_string(),
            Operation {
                signature,
                body: Arc::new(body),
            },
        );
        self
    }
}

/// Builds a `Catalog`. Declaration errors surface from `build`.
#[derive(Default)]
pub struct CatalogBuilder {
    models: Vec<ModelBuilder>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a root model.
    pub fn model(mut self, name: &str, declare: impl FnOnce(ModelBuilder) -> ModelBuilder) -> Self {
        self.models
            .push(declare(ModelBuilder::new(name.to_string(), None)));
        self
    }

    /// Declare a subtype of an already declared model.
    pub fn subtype(
        mut self,
        name: &str,
        parent: &str,
        declare: impl FnOnce(ModelBuilder) -> ModelBuilder,
    ) -> Self {
        self.models.push(declare(ModelBuilder::new(
            name.to_string(),
            Some(parent.to_string()),
        )));
        self
    }

    pub fn build(self) -> ScopeResult<Catalog> {
        let mut models: HashMap<String, Arc<ModelDef>> = HashMap::new();
        let mut order = Vec::with_capacity(self.models.len());
        let mut tables: HashMap<String, Table> = HashMap::new();

        for builder in self.models {
            if models.contains_key(&builder.name) {
                return Err(ConfigError::DuplicateModel {
                    model: builder.name,
                }
                .into());
            }

            let parent = match &builder.parent {
                Some(parent_name) => Some(models.get(parent_name).cloned().ok_or_else(|| {
                    ConfigError::UnknownParent {
                        model: builder.name.clone(),
                        parent: parent_name.clone(),
                    }
                })?),
                None => None,
            };

            let registry = ScopeRegistry::new(builder.name.clone());
            if let (true, Some(parent)) = (builder.inherit_scopes, &parent) {
                for def in parent.registry.effective_definitions() {
                    registry.declare(def.name, def.signature)?;
                }
            }
            for exposure in builder.exposures {
                match exposure {
                    Exposure::Scope(name, signature) => registry.declare(name, signature)?,
                    Exposure::Bare(name) => registry.declare_bare_method(name)?,
                };
            }

            let table = parent
                .as_ref()
                .map(|p| p.table.clone())
                .unwrap_or_else(|| builder.name.clone());
            tables.entry(table.clone()).or_default();

            tracing::debug!(
                model = %builder.name,
                table = %table,
                scopes = registry.len(),
                "Model declared"
            );

            order.push(builder.name.clone());
            models.insert(
                builder.name.clone(),
                Arc::new(ModelDef {
                    descriptor: TypeDescriptor::new(builder.name),
                    parent,
                    table,
                    registry,
                    operations: builder.operations,
                }),
            );
        }

        Ok(Catalog {
            inner: Arc::new(CatalogInner {
                models,
                order,
                tables,
            }),
        })
    }
}

// =============================================================================
// CATALOG
// =============================================================================

struct CatalogInner {
    models: HashMap<String, Arc<ModelDef>>,
    order: Vec<String>,
    tables: HashMap<String, Table>,
}

/// Shared handle to a set of models and their records. Cloning is cheap.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Handle for one model.
    pub fn model(&self, name: &str) -> ScopeResult<Model> {
        Ok(Model {
            catalog: self.clone(),
            def: self.definition(name)?,
        })
    }

    /// Model names in declaration order.
    pub fn model_names(&self) -> &[String] {
        &self.inner.order
    }

    /// The model itself followed by every model below it, in declaration
    /// order.
    pub fn type_family(&self, name: &str) -> Vec<String> {
        self.inner
            .order
            .iter()
            .filter(|candidate| {
                candidate.as_str() == name
                    || self
                        .inner
                        .models
                        .get(candidate.as_str())
                        .is_some_and(|def| def.has_ancestor(name))
            })
            .cloned()
            .collect()
    }

    /// Unfiltered collection over a model. Subtypes see only their own
    /// family's rows.
    pub fn all(&self, name: &str) -> ScopeResult<Query> {
        Ok(Query::new(self.clone(), self.definition(name)?))
    }

    /// Store a record. An id of 0 is replaced with the next free id.
    pub fn insert(&self, record: Record) -> ScopeResult<u64> {
        let def = self.definition(&record.type_name)?;
        let table = self.table(&def.table)?;
        let mut rows = table.write().map_err(|_| CollectionError::LockPoisoned)?;

        let mut record = record;
        if record.id == 0 {
            record.id = rows
                .keys()
                .next_back()
                .map_or(Some(1), |last| last.checked_add(1))
                .ok_or_else(|| CollectionError::IdSpaceExhausted {
                    table: def.table.clone(),
                })?;
        } else if rows.contains_key(&record.id) {
            return Err(CollectionError::DuplicateRecord {
                table: def.table.clone(),
                id: record.id,
            }
            .into());
        }

        let id = record.id;
        rows.insert(id, record);
        Ok(id)
    }

    /// Store several records, returning their ids in order.
    pub fn insert_all(&self, records: impl IntoIterator<Item = Record>) -> ScopeResult<Vec<u64>> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    pub(crate) fn definition(&self, name: &str) -> ScopeResult<Arc<ModelDef>> {
        self.inner.models.get(name).cloned().ok_or_else(|| {
            ScopeError::from(CollectionError::UnknownModel {
                model: name.to_string(),
            })
        })
    }

    pub(crate) fn table(&self, name: &str) -> ScopeResult<&Table> {
        self.inner.tables.get(name).ok_or_else(|| {
            ScopeError::from(CollectionError::UnknownModel {
                model: name.to_string(),
            })
        })
    }

    pub(crate) fn same_as(&self, other: &Catalog) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl TypeResolver for Catalog {
    fn resolve(&self, name: &str) -> Option<TypeDescriptor> {
        self.inner.models.get(name).map(|def| def.descriptor.clone())
    }

    fn is_descendant_of(&self, candidate: &TypeDescriptor, base: &TypeDescriptor) -> bool {
        self.inner
            .models
            .get(candidate.name())
            .is_some_and(|def| def.has_ancestor(base.name()))
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("models", &self.inner.order)
            .finish_non_exhaustive()
    }
}

/// A model bound to its catalog.
#[derive(Clone)]
pub struct Model {
    catalog: Catalog,
    def: Arc<ModelDef>,
}

impl Model {
    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn definition(&self) -> &ModelDef {
        &self.def
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Call an operation directly, bypassing request parameters.
    pub fn call(&self, name: &str, args: &[Value]) -> ScopeResult<Query> {
        self.all()?.call(name, args)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Model").field(&self.name()).finish()
    }
}

impl ScopedModel for Model {
    fn descriptor(&self) -> &TypeDescriptor {
        &self.def.descriptor
    }

    fn scope_registry(&self) -> &ScopeRegistry {
        &self.def.registry
    }
}

impl DefaultScope for Model {
    type Collection = Query;

    fn all(&self) -> ScopeResult<Query> {
        Ok(Query::new(self.catalog.clone(), self.def.clone()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
