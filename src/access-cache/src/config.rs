//! Configuration for the permission cache.

use serde::{Deserialize, Serialize};

/// Default bound of the permission-result store.
pub const DEFAULT_MAX_PERMISSION_ENTRIES: usize = 10_000;

/// Default bound of the cascading-boolean store.
pub const DEFAULT_MAX_CASCADING_ENTRIES: usize = 5_000;

/// Configuration for the permission cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether caching is enabled. A disabled cache never stores entries and
    /// never counts lookups.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached permission results. Zero disables the
    /// permission store.
    #[serde(default = "default_max_permission_entries")]
    pub max_permission_entries: usize,

    /// Maximum number of cached cascading booleans. Zero disables the
    /// cascading store.
    #[serde(default = "default_max_cascading_entries")]
    pub max_cascading_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_permission_entries() -> usize {
    DEFAULT_MAX_PERMISSION_ENTRIES
}

fn default_max_cascading_entries() -> usize {
    DEFAULT_MAX_CASCADING_ENTRIES
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_permission_entries: DEFAULT_MAX_PERMISSION_ENTRIES,
            max_cascading_entries: DEFAULT_MAX_CASCADING_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// A configuration that disables caching entirely.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Same configuration with different store bounds.
    pub fn with_bounds(mut self, max_permission_entries: usize, max_cascading_entries: usize) -> Self {
        self.max_permission_entries = max_permission_entries;
        self.max_cascading_entries = max_cascading_entries;
        self
    }
}
