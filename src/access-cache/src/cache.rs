//! The two-store permission cache.

use std::sync::atomic::{AtomicU64, Ordering};

use access_protocol::AssetPermissionResult;
use serde::Serialize;

use crate::config::CacheConfig;
use crate::key::{CascadeKey, PermissionKey};
use crate::store::{BoundedStore, StoreStats};

/// Process-local permission cache.
///
/// Built once per process and shared by handle (`Arc<PermissionCache>`);
/// tests build their own isolated instances.
///
/// Every invalidation advances a generation counter before removing entries.
/// Resolutions that started under an older generation must not write their
/// result back, see [`PermissionCache::set_permission_if_current`].
#[derive(Debug)]
pub struct PermissionCache {
    /// Configuration for this cache.
    config: CacheConfig,

    /// `(user, asset, type, required role)` -> full result.
    pub(crate) permissions: BoundedStore<PermissionKey, AssetPermissionResult>,

    /// `(user, asset, type)` -> reachable through a container.
    pub(crate) cascading: BoundedStore<CascadeKey, bool>,

    /// Advanced by every invalidation.
    generation: AtomicU64,
}

impl PermissionCache {
    /// Creates a new cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            permissions: BoundedStore::new(
                "permission",
                config.max_permission_entries,
                config.enabled,
            ),
            cascading: BoundedStore::new("cascading", config.max_cascading_entries, config.enabled),
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Creates a new cache with default bounds (10,000 / 5,000).
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Returns whether caching is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current invalidation generation. Capture it before reading storage and
    /// hand it to the `*_if_current` setters.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn advance_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get_permission(&self, key: &PermissionKey) -> Option<AssetPermissionResult> {
        let found = self.permissions.get(key);
        tracing::trace!(
            user_id = %key.user_id,
            asset_id = %key.asset_id,
            asset_type = %key.asset_type,
            required_role = %key.required_role,
            hit = found.is_some(),
            "Permission cache lookup"
        );
        found
    }

    pub fn set_permission(&self, key: PermissionKey, result: AssetPermissionResult) {
        self.permissions.insert(key, result);
    }

    /// Stores `result` unless an invalidation happened since `generation`
    /// was captured. Returns whether the entry was written.
    pub fn set_permission_if_current(
        &self,
        key: PermissionKey,
        result: AssetPermissionResult,
        generation: u64,
    ) -> bool {
        let written = self
            .permissions
            .insert_if(key, result, || self.generation() == generation);
        if !written && self.config.enabled {
            tracing::debug!(
                user_id = %key.user_id,
                asset_id = %key.asset_id,
                "Dropped permission result computed before an invalidation"
            );
        }
        written
    }

    pub fn peek_permission(&self, key: &PermissionKey) -> Option<AssetPermissionResult> {
        self.permissions.peek(key)
    }

    pub fn get_cascading(&self, key: &CascadeKey) -> Option<bool> {
        let found = self.cascading.get(key);
        tracing::trace!(
            user_id = %key.user_id,
            asset_id = %key.asset_id,
            asset_type = %key.asset_type,
            hit = found.is_some(),
            "Cascading cache lookup"
        );
        found
    }

    pub fn set_cascading(&self, key: CascadeKey, reachable: bool) {
        self.cascading.insert(key, reachable);
    }

    /// Cascading counterpart of [`PermissionCache::set_permission_if_current`].
    pub fn set_cascading_if_current(&self, key: CascadeKey, reachable: bool, generation: u64) -> bool {
        self.cascading
            .insert_if(key, reachable, || self.generation() == generation)
    }

    pub fn peek_cascading(&self, key: &CascadeKey) -> Option<bool> {
        self.cascading.peek(key)
    }

    /// Number of entries across both stores.
    pub fn len(&self) -> usize {
        self.permissions.len() + self.cascading.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns statistics for both stores.
    pub fn stats(&self) -> PermissionCacheStats {
        PermissionCacheStats {
            permission: self.permissions.stats(),
            cascading: self.cascading.stats(),
        }
    }

    /// Zeroes both stores' counters, keeping entries.
    pub fn reset_stats(&self) {
        self.permissions.reset_stats();
        self.cascading.reset_stats();
    }

    /// Empties both stores and resets both counters.
    pub fn clear_all(&self) {
        self.advance_generation();
        let removed = self.permissions.clear() + self.cascading.clear();
        self.reset_stats();
        tracing::info!(removed, "Cleared all permission caches");
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Statistics for both stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionCacheStats {
    pub permission: StoreStats,
    pub cascading: StoreStats,
}
