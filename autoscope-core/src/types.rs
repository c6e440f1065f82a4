//! Type descriptors, built-in scopes and pagination

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named type within a record hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDescriptor {
    name: String,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Pseudo-scopes every type exposes as static scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinScope {
    /// No filter
    All,
    /// The first record by identifier
    First,
    /// The last record by identifier
    Last,
}

impl BuiltinScope {
    pub const ALL: [Self; 3] = [Self::All, Self::First, Self::Last];

    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::First => "first",
            Self::Last => "last",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// A page request. Both fields are 1-based and positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Number of records to skip.
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.per_page as u64
    }
}
