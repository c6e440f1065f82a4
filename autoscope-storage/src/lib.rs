//! autoscope Storage - In-Memory Collections
//!
//! A reference implementation of the `Collection` and `TypeResolver`
//! contracts: models declared in a `Catalog`, records kept in per-root
//! tables, and immutable `Query` values that the engine composes.

pub mod catalog;
pub mod demo;
pub mod filter;
pub mod query;
pub mod record;

pub use catalog::{Catalog, CatalogBuilder, Model, ModelBuilder, ModelDef, ScopeFn};
pub use filter::{FilterExpr, FilterOperator};
pub use query::{OrderKey, Query, QueryPlan, SortDirection};
pub use record::{Record, ID_FIELD, TYPE_FIELD};
