//! Configuration types

use crate::{ConfigError, ScopeResult};
use serde::{Deserialize, Serialize};

/// Default page when only `per_page` is supplied.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when only `page` is supplied.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoscopeConfig {
    /// Page used when the request omits `page`
    pub default_page: u32,
    /// Page size used when the request omits `per_page`
    pub default_per_page: u32,
    /// Upper bound for a requested `per_page`; `None` means unbounded
    pub max_per_page: Option<u32>,
}

impl Default for AutoscopeConfig {
    fn default() -> Self {
        Self {
            default_page: DEFAULT_PAGE,
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: None,
        }
    }
}

impl AutoscopeConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `AUTOSCOPE_DEFAULT_PAGE`: page when none is requested (default: 1)
    /// - `AUTOSCOPE_DEFAULT_PER_PAGE`: page size when none is requested (default: 20)
    /// - `AUTOSCOPE_MAX_PER_PAGE`: cap on requested page sizes (default: unbounded)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_page: std::env::var("AUTOSCOPE_DEFAULT_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_page),
            default_per_page: std::env::var("AUTOSCOPE_DEFAULT_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_per_page),
            max_per_page: std::env::var("AUTOSCOPE_MAX_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(defaults.max_per_page),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - default_page > 0
    /// - default_per_page > 0
    /// - max_per_page, when set, is at least default_per_page
    pub fn validate(&self) -> ScopeResult<()> {
        if self.default_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_page".to_string(),
                value: self.default_page.to_string(),
                reason: "default_page must be greater than 0".to_string(),
            }
            .into());
        }

        if self.default_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_per_page".to_string(),
                value: self.default_per_page.to_string(),
                reason: "default_per_page must be greater than 0".to_string(),
            }
            .into());
        }

        if let Some(max) = self.max_per_page {
            if max < self.default_per_page {
                return Err(ConfigError::InvalidValue {
                    field: "max_per_page".to_string(),
                    value: max.to_string(),
                    reason: "max_per_page must not be below default_per_page".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Apply the `max_per_page` cap.
    pub fn clamp_per_page(&self, per_page: u32) -> u32 {
        match self.max_per_page {
            Some(max) => per_page.min(max),
            None => per_page,
        }
    }
}
