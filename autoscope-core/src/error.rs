//! Error types for autoscope operations

use thiserror::Error;

/// Request parameter shape errors.
///
/// These are structural faults: the engine cannot interpret the request and
/// hands the problem back to the caller instead of guessing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Request parameters must be an object, got {found}")]
    NotAnObject { found: String },

    #[error("Arguments for scope '{scope}' must be an object, got {found}")]
    MalformedScopeArguments { scope: String, found: String },

    #[error("Rest argument '{argument}' of scope '{scope}' must be a list, got {found}")]
    MalformedRestArgument {
        scope: String,
        argument: String,
        found: String,
    },

    #[error("Invalid pagination value for {field}: {value}")]
    InvalidPagination { field: String, value: String },

    #[error("Malformed query string key '{key}': {reason}")]
    MalformedQueryKey { key: String, reason: String },

    #[error("Conflicting shapes for query parameter '{key}'")]
    ConflictingQueryShape { key: String },
}

/// Type narrowing failures.
///
/// The engine logs these and passes the collection through unchanged; they
/// never reach the caller of `add_scopes`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeFilterError {
    #[error("Unknown type: {name}")]
    UnknownType { name: String },

    #[error("{candidate} is not a descendant of {base}")]
    NotADescendant { candidate: String, base: String },
}

/// Scope declaration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid scope name '{name}' on {model}")]
    InvalidScopeName { model: String, name: String },

    #[error("Invalid signature for scope '{scope}': {reason}")]
    InvalidSignature { scope: String, reason: String },
}

/// Errors raised by a collection while applying an operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Unknown operation '{name}' on {model}")]
    UnknownOperation { model: String, name: String },

    #[error("Wrong number of arguments for '{name}': got {got}, expected {expected}")]
    ArityMismatch {
        name: String,
        got: usize,
        expected: String,
    },

    #[error("Invalid argument for '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Unknown model: {model}")]
    UnknownModel { model: String },

    #[error("Record {id} already exists in {table}")]
    DuplicateRecord { table: String, id: u64 },

    #[error("No free record id left in {table}")]
    IdSpaceExhausted { table: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate model definition: {model}")]
    DuplicateModel { model: String },

    #[error("Unknown parent model '{parent}' for {model}")]
    UnknownParent { model: String, parent: String },
}

/// Master error type for all autoscope errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Params error: {0}")]
    Params(#[from] ParamsError),

    #[error("Type filter error: {0}")]
    TypeFilter(#[from] TypeFilterError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for autoscope operations.
pub type ScopeResult<T> = Result<T, ScopeError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_error_display_malformed_scope_arguments() {
        let err = ParamsError::MalformedScopeArguments {
            scope: "two_param_scope".to_string(),
            found: "string".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("two_param_scope"));
        assert!(msg.contains("string"));
    }

    #[test]
    fn test_type_filter_error_display_not_a_descendant() {
        let err = TypeFilterError::NotADescendant {
            candidate: "Post".to_string(),
            base: "User".to_string(),
        };
        assert_eq!(err.to_string(), "Post is not a descendant of User");
    }

    #[test]
    fn test_collection_error_display_arity_mismatch() {
        let err = CollectionError::ArityMismatch {
            name: "two_param_scope".to_string(),
            got: 1,
            expected: "2".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("got 1"));
        assert!(msg.contains("expected 2"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "default_per_page".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("default_per_page"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_scope_error_from_variants() {
        let params = ScopeError::from(ParamsError::NotAnObject {
            found: "array".to_string(),
        });
        assert!(matches!(params, ScopeError::Params(_)));

        let type_filter = ScopeError::from(TypeFilterError::UnknownType {
            name: "Nope".to_string(),
        });
        assert!(matches!(type_filter, ScopeError::TypeFilter(_)));

        let registry = ScopeError::from(RegistryError::InvalidScopeName {
            model: "Post".to_string(),
            name: String::new(),
        });
        assert!(matches!(registry, ScopeError::Registry(_)));

        let collection = ScopeError::from(CollectionError::LockPoisoned);
        assert!(matches!(collection, ScopeError::Collection(_)));

        let config = ScopeError::from(ConfigError::DuplicateModel {
            model: "User".to_string(),
        });
        assert!(matches!(config, ScopeError::Config(_)));
    }
}
