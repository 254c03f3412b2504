//! Access Cache - Process-local permission cache with event-driven invalidation.
//!
//! Two independent bounded stores back the cache:
//!
//! - the **permission store**, keyed by `(user, asset, asset type, required role)`
//!   and holding full [`AssetPermissionResult`](access_protocol::AssetPermissionResult)s;
//! - the **cascading store**, keyed by `(user, asset, asset type)` and holding
//!   whether the asset is reachable through a container the user can view.
//!
//! Entries never expire on their own. They leave the cache through explicit
//! invalidation or through LRU eviction once a store is full.
//!
//! # Example
//!
//! ```
//! use access_cache::{PermissionCache, PermissionKey};
//! use access_protocol::{AssetPermissionResult, AssetType, Role};
//! use uuid::Uuid;
//!
//! let cache = PermissionCache::with_defaults();
//! let key = PermissionKey::new(Uuid::new_v4(), Uuid::new_v4(), AssetType::Chat, Role::CanView);
//!
//! assert!(cache.get_permission(&key).is_none());
//! cache.set_permission(key, AssetPermissionResult::direct(Role::CanEdit));
//! assert_eq!(cache.get_permission(&key), Some(AssetPermissionResult::direct(Role::CanEdit)));
//!
//! cache.invalidate_asset(key.asset_id, key.asset_type);
//! assert!(cache.get_permission(&key).is_none());
//! ```

mod cache;
mod config;
mod invalidation;
mod key;
mod store;

pub use cache::{PermissionCache, PermissionCacheStats};
pub use config::{CacheConfig, DEFAULT_MAX_CASCADING_ENTRIES, DEFAULT_MAX_PERMISSION_ENTRIES};
pub use key::{CascadeKey, PermissionKey};
pub use store::{BoundedStore, StoreStats};
