//! autoscope Registry - Declared Scopes per Type
//!
//! Each model type owns one [`ScopeRegistry`]. Declarations happen once, at
//! type-definition time; request handling only reads. The registry keeps
//! declaration order, which is the order the engine applies scopes in.

use autoscope_core::{
    BuiltinScope, Collection, RegistryError, ScopeDefinition, ScopeResult, Signature,
    TypeDescriptor,
};
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A type whose collections can be narrowed by request parameters.
pub trait ScopedModel {
    /// The type descriptor of the model.
    fn descriptor(&self) -> &TypeDescriptor;

    /// The registry holding the scopes visible to the API for this model.
    fn scope_registry(&self) -> &ScopeRegistry;
}

/// A model that can hand out its unfiltered collection, the default
/// starting point for scope application.
pub trait DefaultScope: ScopedModel {
    type Collection: Collection;

    fn all(&self) -> ScopeResult<Self::Collection>;
}

#[derive(Debug, Default, Clone, Serialize)]
struct RegistryState {
    declared: Vec<ScopeDefinition>,
    bare_methods: Vec<String>,
}

/// Scope metadata for one model type.
#[derive(Debug)]
pub struct ScopeRegistry {
    model: String,
    state: RwLock<RegistryState>,
}

impl ScopeRegistry {
    /// Create an empty registry owned by `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Name of the owning model.
    pub fn model(&self) -> &str {
        &self.model
    }

    // The state is append-only, so a panic mid-write cannot leave it torn.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_name(&self, name: &str) -> ScopeResult<()> {
        if name.trim().is_empty() || name != name.trim() {
            return Err(RegistryError::InvalidScopeName {
                model: self.model.clone(),
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Declare a scope with its argument signature.
    ///
    /// Re-declaring a name replaces its signature but keeps its original
    /// position in the application order.
    pub fn declare(&self, name: impl Into<String>, signature: Signature) -> ScopeResult<&Self> {
        let name = name.into();
        self.check_name(&name)?;
        signature.validate(&name)?;

        tracing::debug!(
            model = %self.model,
            scope = %name,
            arity = %signature.arity(),
            "Declared scope"
        );

        let mut state = self.write();
        match state.declared.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.signature = signature,
            None => state.declared.push(ScopeDefinition::new(name, signature)),
        }
        Ok(self)
    }

    /// Expose an existing zero-argument collection method as a static scope.
    pub fn declare_bare_method(&self, name: impl Into<String>) -> ScopeResult<&Self> {
        let name = name.into();
        self.check_name(&name)?;

        tracing::debug!(model = %self.model, scope = %name, "Declared bare scope method");

        let mut state = self.write();
        if !state.bare_methods.contains(&name) {
            state.bare_methods.push(name);
        }
        Ok(self)
    }

    /// Every scope visible for this type: declared scopes in declaration
    /// order, then bare methods with a freshly built empty signature.
    pub fn effective_definitions(&self) -> Vec<ScopeDefinition> {
        let state = self.read();
        let mut definitions: Vec<ScopeDefinition> = state
            .declared
            .iter()
            .filter(|d| !state.bare_methods.contains(&d.name))
            .cloned()
            .collect();
        definitions.extend(
            state
                .bare_methods
                .iter()
                .map(|name| ScopeDefinition::new(name.clone(), Signature::new())),
        );
        definitions
    }

    /// Names of zero-argument scopes plus the built-in `all`, `first`, `last`.
    pub fn static_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .effective_definitions()
            .into_iter()
            .filter(ScopeDefinition::is_static)
            .map(|d| d.name)
            .collect();
        for builtin in BuiltinScope::ALL {
            if !names.iter().any(|n| n == builtin.name()) {
                names.push(builtin.name().to_string());
            }
        }
        names
    }

    /// Scopes taking at least one argument, in declaration order.
    pub fn dynamic_definitions(&self) -> Vec<ScopeDefinition> {
        self.effective_definitions()
            .into_iter()
            .filter(|d| !d.is_static())
            .collect()
    }

    /// The effective definition for `name`, if any.
    pub fn definition(&self, name: &str) -> Option<ScopeDefinition> {
        self.effective_definitions()
            .into_iter()
            .find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        let state = self.read();
        state.declared.iter().any(|d| d.name == name) || state.bare_methods.iter().any(|n| n == name)
    }

    /// Effective scope names in application order.
    pub fn names(&self) -> Vec<String> {
        self.effective_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.effective_definitions().len()
    }

    pub fn is_empty(&self) -> bool {
        let state = self.read();
        state.declared.is_empty() && state.bare_methods.is_empty()
    }
}

impl Serialize for ScopeRegistry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.read().serialize(serializer)
    }
}
