//! autoscope Engine - Request-Driven Scope Application
//!
//! Turns a request's parameters into a chain of named operations on a
//! collection. Each model type declares which of its scopes are reachable
//! from requests (see `autoscope-registry`); the engine looks those names
//! up in the parameters, binds their arguments, and applies them in a fixed
//! order: type narrowing, static scopes, dynamic scopes, pagination.
//!
//! ```text
//! ?type=Admin&active=1&by_user[user_id]=3&page=2
//!   -> restrict_to_type(Admin) -> active -> by_user(3) -> paginate(2, 20)
//! ```

pub mod binding;
pub mod engine;
pub mod telemetry;

pub use binding::bind_arguments;
pub use engine::{add_scopes, add_scopes_to_all, ScopeEngine};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig, TelemetryError};

// Re-export the types callers need alongside the engine
pub use autoscope_core::{
    AutoscopeConfig, Collection, RequestParams, ScopeError, ScopeResult, TypeResolver,
};
pub use autoscope_registry::{DefaultScope, ScopeRegistry, ScopedModel};
