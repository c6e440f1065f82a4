//! Scope argument signatures
//!
//! A scope declares its arguments once, at definition time, as an ordered
//! list of [`ArgDef`]s. Binding forwards values positionally in that order.

use crate::{RegistryError, ScopeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many values an argument binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one value, forwarded even when absent
    #[serde(rename = "req")]
    Required,
    /// Forwarded only when supplied and non-null
    #[serde(rename = "opt")]
    Optional,
    /// Variadic tail; every element is forwarded individually
    #[serde(rename = "rest")]
    Rest,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "req",
            Self::Optional => "opt",
            Self::Rest => "rest",
        };
        f.write_str(s)
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgDef {
    pub name: String,
    pub cardinality: Cardinality,
}

impl ArgDef {
    pub fn new(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            cardinality,
        }
    }

    pub fn req(name: impl Into<String>) -> Self {
        Self::new(name, Cardinality::Required)
    }

    pub fn opt(name: impl Into<String>) -> Self {
        Self::new(name, Cardinality::Optional)
    }

    pub fn rest(name: impl Into<String>) -> Self {
        Self::new(name, Cardinality::Rest)
    }
}

/// Ordered argument signature of a scope. Empty means static.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature {
    args: Vec<ArgDef>,
}

impl Signature {
    /// An empty signature (static scope).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_args(args: impl IntoIterator<Item = ArgDef>) -> Self {
        Self {
            args: args.into_iter().collect(),
        }
    }

    /// Append a required argument.
    pub fn req(mut self, name: impl Into<String>) -> Self {
        self.args.push(ArgDef::req(name));
        self
    }

    /// Append an optional argument.
    pub fn opt(mut self, name: impl Into<String>) -> Self {
        self.args.push(ArgDef::opt(name));
        self
    }

    /// Append the variadic tail.
    pub fn rest(mut self, name: impl Into<String>) -> Self {
        self.args.push(ArgDef::rest(name));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArgDef> {
        self.args.iter()
    }

    pub fn args(&self) -> &[ArgDef] {
        &self.args
    }

    pub fn get(&self, name: &str) -> Option<&ArgDef> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn required_count(&self) -> usize {
        self.count(Cardinality::Required)
    }

    pub fn optional_count(&self) -> usize {
        self.count(Cardinality::Optional)
    }

    pub fn has_rest(&self) -> bool {
        self.count(Cardinality::Rest) > 0
    }

    fn count(&self, cardinality: Cardinality) -> usize {
        self.args
            .iter()
            .filter(|a| a.cardinality == cardinality)
            .count()
    }

    /// Whether a positional call with `n` arguments fits this signature.
    pub fn accepts(&self, n: usize) -> bool {
        let min = self.required_count();
        if self.has_rest() {
            n >= min
        } else {
            n >= min && n <= min + self.optional_count()
        }
    }

    /// Human-readable arity, e.g. `2`, `1..=2`, `1+`.
    pub fn arity(&self) -> String {
        let min = self.required_count();
        let max = min + self.optional_count();
        if self.has_rest() {
            format!("{min}+")
        } else if min == max {
            min.to_string()
        } else {
            format!("{min}..={max}")
        }
    }

    /// Check the signature is something a positional call can satisfy:
    /// non-empty unique names, at most one rest argument, and rest last.
    pub fn validate(&self, scope: &str) -> ScopeResult<()> {
        let invalid = |reason: String| RegistryError::InvalidSignature {
            scope: scope.to_string(),
            reason,
        };

        for (i, arg) in self.args.iter().enumerate() {
            if arg.name.trim().is_empty() {
                return Err(invalid(format!("argument {i} has an empty name")).into());
            }
            if self.args[..i].iter().any(|a| a.name == arg.name) {
                return Err(invalid(format!("duplicate argument '{}'", arg.name)).into());
            }
            if arg.cardinality == Cardinality::Rest && i + 1 != self.args.len() {
                return Err(invalid(format!("rest argument '{}' must be last", arg.name)).into());
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Signature {
    type Item = &'a ArgDef;
    type IntoIter = std::slice::Iter<'a, ArgDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.iter()
    }
}

impl FromIterator<ArgDef> for Signature {
    fn from_iter<T: IntoIterator<Item = ArgDef>>(iter: T) -> Self {
        Self::from_args(iter)
    }
}

/// A named scope and its argument signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDefinition {
    pub name: String,
    pub signature: Signature,
}

impl ScopeDefinition {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
        }
    }

    /// Static scopes take no arguments.
    pub fn is_static(&self) -> bool {
        self.signature.is_empty()
    }
}
