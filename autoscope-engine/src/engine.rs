//! Scope application engine
//!
//! Applies, in this fixed order, to a starting collection:
//! 1. type narrowing (`type`)
//! 2. static scopes and the implicit `ids` filter
//! 3. dynamic scopes, arguments bound from `params[scope]`
//! 4. pagination (`page` / `per_page`)
//!
//! Each stage consumes the output of the previous one. Collections are
//! values: nothing is mutated in place.

use crate::binding::bind_arguments;
use autoscope_core::value::as_u64;
use autoscope_core::{
    AutoscopeConfig, Collection, Pagination, ParamsError, RequestParams, ScopeResult,
    TypeDescriptor, TypeFilterError, TypeResolver, Value, IDS_PARAM, PAGE_PARAM, PER_PAGE_PARAM,
    TYPE_PARAM,
};
use autoscope_registry::{DefaultScope, ScopeRegistry, ScopedModel};

/// Binds request parameters to the scopes declared for one model type.
#[derive(Debug)]
pub struct ScopeEngine<'a, R: ?Sized> {
    model: &'a TypeDescriptor,
    registry: &'a ScopeRegistry,
    resolver: &'a R,
    config: AutoscopeConfig,
}

impl<'a, R: TypeResolver + ?Sized> ScopeEngine<'a, R> {
    /// Create an engine for `model`, reading its scopes from `registry` and
    /// resolving `type` parameters through `resolver`.
    pub fn new(model: &'a TypeDescriptor, registry: &'a ScopeRegistry, resolver: &'a R) -> Self {
        Self {
            model,
            registry,
            resolver,
            config: AutoscopeConfig::default(),
        }
    }

    /// Create an engine from anything that knows its own registry.
    pub fn for_model<M: ScopedModel + ?Sized>(model: &'a M, resolver: &'a R) -> Self {
        Self::new(model.descriptor(), model.scope_registry(), resolver)
    }

    pub fn with_config(mut self, config: AutoscopeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AutoscopeConfig {
        &self.config
    }

    pub fn model(&self) -> &TypeDescriptor {
        self.model
    }

    /// Apply every scope referenced by `params` to `scope`.
    ///
    /// Unknown or unrelated `type` values are logged and ignored. Only
    /// malformed parameter shapes and collection failures are returned.
    pub fn add_scopes<C: Collection>(&self, params: &RequestParams, scope: C) -> ScopeResult<C> {
        let span = tracing::debug_span!("add_scopes", model = %self.model);
        let _enter = span.enter();

        let scope = self.add_type_filter(params, scope)?;
        let scope = self.add_static_scopes(params, scope)?;
        let scope = self.add_dynamic_scopes(params, scope)?;
        self.add_pagination(params, scope)
    }

    /// Narrow to the subtype named by `params.type`, merging with the
    /// conditions already on `scope`.
    pub fn add_type_filter<C: Collection>(
        &self,
        params: &RequestParams,
        scope: C,
    ) -> ScopeResult<C> {
        let Some(requested) = params.present(TYPE_PARAM) else {
            return Ok(scope);
        };

        match self.narrowing_target(requested) {
            Ok(ty) => {
                tracing::debug!(model = %self.model, narrowed_to = %ty, "Applying type filter");
                scope.restrict_to_type(&ty)
            }
            Err(err) => {
                tracing::error!(
                    model = %self.model,
                    requested_type = %requested,
                    error = %err,
                    "Ignoring type filter"
                );
                Ok(scope)
            }
        }
    }

    fn narrowing_target(&self, requested: &Value) -> Result<TypeDescriptor, TypeFilterError> {
        let name = match requested {
            Value::String(s) => s.trim(),
            other => {
                return Err(TypeFilterError::UnknownType {
                    name: other.to_string(),
                })
            }
        };

        let ty = self
            .resolver
            .resolve(name)
            .ok_or_else(|| TypeFilterError::UnknownType {
                name: name.to_string(),
            })?;

        if !self.resolver.is_descendant_of(&ty, self.model) {
            return Err(TypeFilterError::NotADescendant {
                candidate: ty.name().to_string(),
                base: self.model.name().to_string(),
            });
        }

        Ok(ty)
    }

    /// Apply every zero-argument scope whose name is present in `params`,
    /// then the implicit `ids` filter.
    pub fn add_static_scopes<C: Collection>(
        &self,
        params: &RequestParams,
        mut scope: C,
    ) -> ScopeResult<C> {
        for name in self.registry.static_names() {
            if params.is_present(&name) {
                tracing::debug!(model = %self.model, scope = %name, "Applying static scope");
                scope = scope.apply_operation(&name, &[])?;
            }
        }

        if let Some(ids) = params.present(IDS_PARAM) {
            let ids = match ids {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            tracing::debug!(model = %self.model, count = ids.len(), "Applying ids filter");
            scope = scope.restrict_to_ids(&ids)?;
        }

        Ok(scope)
    }

    /// Apply every scope with arguments whose name is present in `params`.
    pub fn add_dynamic_scopes<C: Collection>(
        &self,
        params: &RequestParams,
        mut scope: C,
    ) -> ScopeResult<C> {
        for definition in self.registry.dynamic_definitions() {
            let Some(args) = params
                .present(&definition.name)
                .filter(|args| any_argument_present(args))
            else {
                continue;
            };

            let bound = bind_arguments(&definition.name, &definition.signature, args)?;
            tracing::debug!(
                model = %self.model,
                scope = %definition.name,
                args = bound.len(),
                "Applying dynamic scope"
            );
            scope = scope.apply_operation(&definition.name, &bound)?;
        }

        Ok(scope)
    }

    /// Paginate when `page` or `per_page` is supplied; the missing one takes
    /// its configured default.
    pub fn add_pagination<C: Collection>(&self, params: &RequestParams, scope: C) -> ScopeResult<C> {
        let page = params.get(PAGE_PARAM).filter(|v| supplied(v));
        let per_page = params.get(PER_PAGE_PARAM).filter(|v| supplied(v));

        if page.is_none() && per_page.is_none() {
            return Ok(scope);
        }

        let pagination = Pagination::new(
            page_number(PAGE_PARAM, page, self.config.default_page)?,
            self.config
                .clamp_per_page(page_number(PER_PAGE_PARAM, per_page, self.config.default_per_page)?),
        );

        tracing::debug!(
            model = %self.model,
            page = pagination.page,
            per_page = pagination.per_page,
            "Applying pagination"
        );
        scope.paginate(pagination)
    }
}

// An argument object whose every value is blank counts as blank itself.
fn any_argument_present(args: &Value) -> bool {
    match args {
        Value::Object(map) => map.values().any(autoscope_core::is_present),
        _ => true,
    }
}

fn supplied(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn page_number(field: &str, value: Option<&Value>, default: u32) -> ScopeResult<u32> {
    let Some(value) = value.filter(|v| autoscope_core::is_present(v)) else {
        return Ok(default);
    };

    as_u64(value)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            ParamsError::InvalidPagination {
                field: field.to_string(),
                value: value.to_string(),
            }
            .into()
        })
}

/// Apply `params` to `scope` for `model` in one call.
pub fn add_scopes<M, R, C>(
    model: &M,
    resolver: &R,
    params: &RequestParams,
    scope: C,
) -> ScopeResult<C>
where
    M: ScopedModel + ?Sized,
    R: TypeResolver + ?Sized,
    C: Collection,
{
    ScopeEngine::for_model(model, resolver).add_scopes(params, scope)
}

/// Apply `params` starting from the model's unfiltered collection.
pub fn add_scopes_to_all<M, R>(
    model: &M,
    resolver: &R,
    params: &RequestParams,
) -> ScopeResult<M::Collection>
where
    M: DefaultScope + ?Sized,
    R: TypeResolver + ?Sized,
{
    let scope = model.all()?;
    add_scopes(model, resolver, params, scope)
}
