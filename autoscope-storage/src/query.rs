//! Immutable queries over a catalog table

use crate::catalog::{Catalog, ModelDef};
use crate::filter::{compare, FilterExpr, FilterOperator};
use crate::record::{Record, ID_FIELD, TYPE_FIELD};
use autoscope_core::{
    BuiltinScope, Collection, CollectionError, Map, Pagination, ScopeResult, Signature,
    TypeDescriptor, Value,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Sort direction for one ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Serializable description of a query, without its records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub model: String,
    pub filters: Vec<FilterExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<OrderKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// A lazily evaluated selection of records of one model.
///
/// Every builder method returns a new query. Records are read only by
/// `records`, `count`, `first` and `last`.
#[derive(Clone)]
pub struct Query {
    catalog: Catalog,
    model: Arc<ModelDef>,
    filters: Vec<FilterExpr>,
    types: Option<Vec<String>>,
    order: Vec<OrderKey>,
    limit: Option<u64>,
    offset: Option<u64>,
    pagination: Option<Pagination>,
}

impl Query {
    pub(crate) fn new(catalog: Catalog, model: Arc<ModelDef>) -> Self {
        let types = (!model.is_root()).then(|| catalog.type_family(model.name()));
        Self {
            catalog,
            model,
            filters: Vec::new(),
            types,
            order: Vec::new(),
            limit: None,
            offset: None,
            pagination: None,
        }
    }

    fn with(&self, change: impl FnOnce(&mut Query)) -> Query {
        let mut next = self.clone();
        change(&mut next);
        next
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Equality condition. An array value means membership.
    pub fn where_eq(&self, field: &str, value: Value) -> Query {
        match value {
            Value::Array(values) => self.where_in(field, values),
            value => self.filter(FilterExpr::eq(field, value)),
        }
    }

    pub fn where_in(&self, field: &str, values: Vec<Value>) -> Query {
        self.filter(FilterExpr::is_in(field, values))
    }

    pub fn filter(&self, expr: FilterExpr) -> Query {
        self.with(|q| q.filters.push(expr))
    }

    pub fn order_by(&self, field: &str, direction: SortDirection) -> Query {
        self.with(|q| {
            q.order.push(OrderKey {
                field: field.to_string(),
                direction,
            })
        })
    }

    pub fn limit(&self, limit: u64) -> Query {
        self.with(|q| q.limit = Some(limit))
    }

    pub fn offset(&self, offset: u64) -> Query {
        self.with(|q| q.offset = Some(offset))
    }

    /// Conjunction of both queries. Ordering, limits and pagination set on
    /// `other` take precedence.
    pub fn merge(&self, other: &Query) -> Query {
        self.with(|q| {
            if other.model.has_ancestor(q.model.name()) {
                q.model = other.model.clone();
            }
            q.filters.extend(other.filters.iter().cloned());
            q.types = match (q.types.take(), &other.types) {
                (Some(mine), Some(theirs)) => {
                    Some(mine.into_iter().filter(|t| theirs.contains(t)).collect())
                }
                (mine, theirs) => mine.or_else(|| theirs.clone()),
            };
            if !other.order.is_empty() {
                q.order = other.order.clone();
            }
            q.limit = other.limit.or(q.limit);
            q.offset = other.offset.or(q.offset);
            q.pagination = other.pagination.or(q.pagination);
        })
    }

    /// Invoke a named operation: a built-in, or one defined on the model or
    /// an ancestor.
    pub fn call(&self, name: &str, args: &[Value]) -> ScopeResult<Query> {
        if let Some(builtin) = BuiltinScope::from_name(name) {
            check_arity(name, &Signature::new(), args)?;
            return Ok(self.builtin(builtin));
        }

        let operation = self
            .model
            .lookup(name)
            .ok_or_else(|| CollectionError::UnknownOperation {
                model: self.model.name().to_string(),
                name: name.to_string(),
            })?;
        check_arity(name, &operation.signature, args)?;

        tracing::trace!(model = %self.model.name(), operation = %name, args = args.len(), "Applying operation");
        (operation.body)(self, args)
    }

    fn builtin(&self, builtin: BuiltinScope) -> Query {
        match builtin {
            BuiltinScope::All => self.clone(),
            BuiltinScope::First => self.with_default_order().limit(1),
            BuiltinScope::Last => self
                .with_default_order()
                .with(|q| {
                    for key in &mut q.order {
                        key.direction = key.direction.reverse();
                    }
                })
                .limit(1),
        }
    }

    fn with_default_order(&self) -> Query {
        if self.order.is_empty() {
            self.order_by(ID_FIELD, SortDirection::Asc)
        } else {
            self.clone()
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn filters(&self) -> &[FilterExpr] {
        &self.filters
    }

    /// Concrete types this query is restricted to, if any.
    pub fn types(&self) -> Option<&[String]> {
        self.types.as_deref()
    }

    pub fn order(&self) -> &[OrderKey] {
        &self.order
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Equality and membership conditions keyed by field, including the
    /// type restriction under `type`.
    pub fn where_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        for expr in &self.filters {
            if matches!(expr.operator, FilterOperator::Eq | FilterOperator::In) {
                values.insert(expr.field.clone(), expr.value.clone());
            }
        }
        if let Some(types) = &self.types {
            values.insert(
                TYPE_FIELD.to_string(),
                Value::Array(types.iter().cloned().map(Value::String).collect()),
            );
        }
        values
    }

    pub fn plan(&self) -> QueryPlan {
        QueryPlan {
            model: self.model.name().to_string(),
            filters: self.filters.clone(),
            types: self.types.clone(),
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
            pagination: self.pagination,
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn matches(&self, record: &Record) -> bool {
        self.types
            .as_ref()
            .map_or(true, |types| types.contains(&record.type_name))
            && self.filters.iter().all(|f| f.matches(record))
    }

    fn compare_records(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.order {
            let ordering = compare(&a.field(&key.field), &b.field(&key.field))
                .unwrap_or(Ordering::Equal);
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Matching records, ordered, with offset and limit applied.
    pub fn records(&self) -> ScopeResult<Vec<Record>> {
        let table = self.catalog.table(self.model.table())?;
        let mut matched: Vec<Record> = {
            let rows = table.read().map_err(|_| CollectionError::LockPoisoned)?;
            rows.values().filter(|r| self.matches(r)).cloned().collect()
        };

        if !self.order.is_empty() {
            matched.sort_by(|a, b| self.compare_records(a, b));
        }

        let skipped = matched
            .into_iter()
            .skip(self.offset.unwrap_or(0) as usize);
        Ok(match self.limit {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        })
    }

    pub fn ids(&self) -> ScopeResult<Vec<u64>> {
        Ok(self.records()?.into_iter().map(|r| r.id).collect())
    }

    pub fn count(&self) -> ScopeResult<usize> {
        Ok(self.records()?.len())
    }

    pub fn first(&self) -> ScopeResult<Option<Record>> {
        Ok(self.builtin(BuiltinScope::First).records()?.into_iter().next())
    }

    pub fn last(&self) -> ScopeResult<Option<Record>> {
        Ok(self.builtin(BuiltinScope::Last).records()?.into_iter().next())
    }
}

fn check_arity(name: &str, signature: &Signature, args: &[Value]) -> ScopeResult<()> {
    if signature.accepts(args.len()) {
        Ok(())
    } else {
        Err(CollectionError::ArityMismatch {
            name: name.to_string(),
            got: args.len(),
            expected: signature.arity(),
        }
        .into())
    }
}

impl Collection for Query {
    fn model_type(&self) -> &TypeDescriptor {
        self.model.descriptor()
    }

    fn apply_operation(&self, name: &str, args: &[Value]) -> ScopeResult<Self> {
        self.call(name, args)
    }

    fn restrict_to_type(&self, ty: &TypeDescriptor) -> ScopeResult<Self> {
        Ok(self.catalog.all(ty.name())?.merge(self))
    }

    fn restrict_to_ids(&self, ids: &[Value]) -> ScopeResult<Self> {
        Ok(self.where_in(ID_FIELD, ids.to_vec()))
    }

    fn paginate(&self, pagination: Pagination) -> ScopeResult<Self> {
        Ok(self.with(|q| {
            q.pagination = Some(pagination);
            q.limit = Some(u64::from(pagination.per_page));
            q.offset = Some(pagination.offset());
        }))
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.catalog.same_as(&other.catalog) && self.plan() == other.plan()
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("model", &self.model.name())
            .field("filters", &self.filters)
            .field("types", &self.types)
            .field("order", &self.order)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("pagination", &self.pagination)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
