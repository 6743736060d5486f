//! Engine Configuration
//!
//! Provides the knobs applied to a runtime and its first context:
//! memory ceiling, GC threshold, stack size, intrinsic set and the
//! extended capability bundle.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Intrinsic objects installed into a new context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intrinsics {
    /// Every standard built-in (JSON, Date, RegExp, Promise, Proxy, ...)
    #[default]
    Full,

    /// Only the base objects (Object, Function, Error, ...)
    Base,
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum heap size (bytes), unlimited when unset
    pub memory_limit: Option<usize>,

    /// Allocated size at which the collector runs (bytes)
    pub gc_threshold: Option<usize>,

    /// Maximum native stack used by the interpreter (bytes)
    pub max_stack_size: Option<usize>,

    /// Intrinsics for contexts created from this config
    pub intrinsics: Intrinsics,

    /// Install `print`, `std` and `os` on creation
    pub extended_capabilities: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl EngineConfig {
    /// Engine defaults: no limits, full intrinsics
    pub fn standard() -> Self {
        Self {
            memory_limit: None,
            gc_threshold: None,
            max_stack_size: None,
            intrinsics: Intrinsics::Full,
            extended_capabilities: false,
        }
    }

    /// Configuration for running untrusted or embedded scripts
    pub fn constrained() -> Self {
        Self {
            memory_limit: Some(16 * 1024 * 1024),     // 16 MB max
            gc_threshold: Some(12 * 1024 * 1024),     // 12 MB (75%)
            max_stack_size: Some(512 * 1024),         // 512 KB stack
            intrinsics: Intrinsics::Full,
            extended_capabilities: false,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(limit), Some(threshold)) = (self.memory_limit, self.gc_threshold) {
            if threshold > limit {
                return Err(ConfigError::InvalidGcThreshold);
            }
        }
        if let Some(stack) = self.max_stack_size {
            if stack < MIN_STACK_SIZE {
                return Err(ConfigError::StackTooSmall);
            }
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys keep their standard values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

const MIN_STACK_SIZE: usize = 64 * 1024;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GC threshold cannot exceed memory limit")]
    InvalidGcThreshold,

    #[error("Stack size too small (minimum 64KB)")]
    StackTooSmall,

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
