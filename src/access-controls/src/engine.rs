//! The access engine handle.

use std::fmt;
use std::sync::Arc;

use access_cache::PermissionCache;

use crate::config::AccessConfig;
use crate::repository::AccessRepository;

/// Resolves access decisions against a repository, through a shared
/// permission cache.
///
/// Cloning is cheap and clones share the same cache, so one `AccessControl`
/// is built per process and handed to every request task.
#[derive(Clone)]
pub struct AccessControl {
    pub(crate) repository: Arc<dyn AccessRepository>,
    pub(crate) cache: Arc<PermissionCache>,
    pub(crate) config: AccessConfig,
}

impl AccessControl {
    /// Creates an engine with its own cache built from `config.cache`.
    pub fn new(repository: Arc<dyn AccessRepository>, config: AccessConfig) -> Self {
        let cache = Arc::new(PermissionCache::new(config.cache.clone()));
        Self::with_cache(repository, cache, config)
    }

    /// Creates an engine around an existing cache, e.g. one shared with an
    /// invalidation listener.
    pub fn with_cache(
        repository: Arc<dyn AccessRepository>,
        cache: Arc<PermissionCache>,
        config: AccessConfig,
    ) -> Self {
        Self {
            repository,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<PermissionCache> {
        &self.cache
    }

    pub fn repository(&self) -> &Arc<dyn AccessRepository> {
        &self.repository
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }
}

impl fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessControl")
            .field("cache", &self.cache.stats())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
