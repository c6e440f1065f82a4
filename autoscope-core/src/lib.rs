//! autoscope Core - Data Types and Contracts
//!
//! Pure data structures shared by every other crate: request parameters,
//! scope signatures, the error taxonomy, configuration, and the two
//! capability contracts (`Collection`, `TypeResolver`) the engine consumes.
//! This crate contains no scope application logic.

pub mod config;
pub mod error;
pub mod params;
pub mod signature;
pub mod traits;
pub mod types;
pub mod value;

pub use config::{AutoscopeConfig, DEFAULT_PAGE, DEFAULT_PER_PAGE};
pub use error::{
    CollectionError, ConfigError, ParamsError, RegistryError, ScopeError, ScopeResult,
    TypeFilterError,
};
pub use params::{RequestParams, IDS_PARAM, MAX_KEY_DEPTH, PAGE_PARAM, PER_PAGE_PARAM, TYPE_PARAM};
pub use signature::{ArgDef, Cardinality, ScopeDefinition, Signature};
pub use traits::{Collection, TypeResolver};
pub use types::{BuiltinScope, Pagination, TypeDescriptor};
pub use value::{is_blank, is_present, Map, Value};
